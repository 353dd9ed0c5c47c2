//! Domain services: input validation and orchestration over the store.
//!
//! Every function takes a borrowed [`kampus_store::Database`] and the
//! caller's identity explicitly, validates before any write, and returns
//! [`crate::error::ServerError`] mapped onto the HTTP taxonomy.

pub mod accounts;
pub mod admin;
pub mod messaging;
pub mod products;
pub mod ratings;
pub mod reports;

#[cfg(test)]
pub(crate) mod testing {
    use kampus_shared::types::{ProductCategory, ProductCondition, Role};
    use kampus_store::{Database, NewProduct, NewUser, Product, User};
    use uuid::Uuid;

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn user(db: &Database, name: &str) -> User {
        user_with_role(db, name, Role::User)
    }

    pub fn user_with_role(db: &Database, name: &str, role: Role) -> User {
        db.create_user(&NewUser {
            name: name.to_string(),
            email: format!("{}@uni.edu", name.to_lowercase()),
            password_hash: "unused".to_string(),
            phone: None,
            university: "Ege University".to_string(),
            department: "Computer Engineering".to_string(),
            role,
        })
        .unwrap()
    }

    pub fn product(db: &Database, seller: Uuid, title: &str) -> Product {
        db.create_product(&NewProduct {
            title: title.to_string(),
            description: "Barely used, no highlights".to_string(),
            author: "Stewart".to_string(),
            category: ProductCategory::Textbook,
            condition: ProductCondition::LikeNew,
            price: 150.0,
            publish_year: Some(2019),
            university: "Ege University".to_string(),
            department: "Mathematics".to_string(),
            images: vec![],
            seller_id: seller,
        })
        .unwrap()
    }
}
