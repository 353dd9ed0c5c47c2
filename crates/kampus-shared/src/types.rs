use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Declares a closed set of string-valued variants stored as TEXT columns and
/// exchanged as snake_case JSON strings.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(ValidationError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Account role. Moderators may review reports; admins may do everything.
    Role ("role") {
        User => "user",
        Moderator => "moderator",
        Admin => "admin",
    }
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }
}

text_enum! {
    /// `product_inquiry` when the message references a listing.
    MessageType ("message type") {
        Text => "text",
        ProductInquiry => "product_inquiry",
    }
}

impl MessageType {
    pub fn for_product(product_attached: bool) -> Self {
        if product_attached {
            MessageType::ProductInquiry
        } else {
            MessageType::Text
        }
    }
}

text_enum! {
    ProductCategory ("product category") {
        Textbook => "textbook",
        Notes => "notes",
        Stationery => "stationery",
        Other => "other",
    }
}

text_enum! {
    ProductCondition ("product condition") {
        New => "new",
        LikeNew => "like_new",
        Fair => "fair",
        Worn => "worn",
    }
}

text_enum! {
    /// Only `active` listings are visible when browsing.
    ProductStatus ("product status") {
        Active => "active",
        Inactive => "inactive",
        Sold => "sold",
    }
}

text_enum! {
    ReportType ("report type") {
        Spam => "spam",
        Fake => "fake",
        Inappropriate => "inappropriate",
        Fraud => "fraud",
        Other => "other",
    }
}

impl ReportType {
    pub fn label(&self) -> &'static str {
        match self {
            ReportType::Spam => "Spam / unwanted content",
            ReportType::Fake => "Fake or misleading listing",
            ReportType::Inappropriate => "Inappropriate content",
            ReportType::Fraud => "Fraud",
            ReportType::Other => "Other",
        }
    }

    /// Priority assigned when a report of this type is filed.
    pub fn initial_priority(&self) -> ReportPriority {
        match self {
            ReportType::Fraud => ReportPriority::High,
            _ => ReportPriority::Medium,
        }
    }
}

text_enum! {
    ReportCategory ("report category") {
        Product => "product",
        User => "user",
        Message => "message",
    }
}

impl ReportCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ReportCategory::Product => "Listing report",
            ReportCategory::User => "User report",
            ReportCategory::Message => "Message report",
        }
    }
}

text_enum! {
    /// pending -> under_review -> {resolved | rejected}, set by staff only.
    ReportStatus ("report status") {
        Pending => "pending",
        UnderReview => "under_review",
        Resolved => "resolved",
        Rejected => "rejected",
    }
}

impl ReportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::UnderReview => "Under review",
            ReportStatus::Resolved => "Resolved",
            ReportStatus::Rejected => "Rejected",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "orange",
            ReportStatus::UnderReview => "blue",
            ReportStatus::Resolved => "green",
            ReportStatus::Rejected => "red",
        }
    }
}

text_enum! {
    ReportPriority ("report priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}
