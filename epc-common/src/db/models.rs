//! Database models
//!
//! Enumerations stored as TEXT columns. Each enum carries its canonical
//! database label (`to_db_string`) and a lenient parser (`from_db_string`)
//! that accepts the label in any case, with spaces or hyphens in place of
//! underscores.

use serde::{Deserialize, Serialize};

/// Declares a TEXT-backed enum with its canonical database labels.
macro_rules! db_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Canonical database value (lowercase, underscored)
            pub fn to_db_string(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Parse a database or user-supplied label
            pub fn from_db_string(s: &str) -> Option<Self> {
                let key = s.trim().to_lowercase().replace([' ', '-'], "_");
                match key.as_str() {
                    $( $label => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// All variants in declaration order
            pub fn all_variants() -> &'static [$name] {
                &[ $( $name::$variant ),+ ]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.to_db_string())
            }
        }
    };
}

db_enum! {
    /// Kind of hosting organization
    OrganizationType {
        University => "university",
        Government => "government",
        Nonprofit => "nonprofit",
        Organization => "organization",
    }
}

db_enum! {
    /// Manual review state of an organization
    VerificationStatus {
        Pending => "pending",
        Verified => "verified",
    }
}

db_enum! {
    /// Program format
    ProgramType {
        SummerProgram => "summer_program",
        Competition => "competition",
        Scholarship => "scholarship",
        Award => "award",
        Workshop => "workshop",
        Conference => "conference",
        Camp => "camp",
        Program => "program",
    }
}

db_enum! {
    /// Coarse admission bucket derived from an acceptance percentage
    SelectivityTier {
        Elite => "elite",
        HighlySelective => "highly_selective",
        Selective => "selective",
        Open => "open",
    }
}

db_enum! {
    /// Listing status of a program
    ProgramStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

db_enum! {
    /// Storage type of an attribute definition; selects the value column
    DataType {
        String => "string",
        Integer => "integer",
        Decimal => "decimal",
        Boolean => "boolean",
        Date => "date",
        Json => "json",
        Array => "array",
    }
}

db_enum! {
    /// Entity kind an attribute definition applies to
    AppliesTo {
        Programs => "programs",
        Organizations => "organizations",
    }
}

db_enum! {
    /// Taxonomy axis of a category
    CategoryType {
        Subject => "subject",
        Demographic => "demographic",
    }
}

impl Default for SelectivityTier {
    fn default() -> Self {
        SelectivityTier::Open
    }
}

impl Default for ProgramType {
    fn default() -> Self {
        ProgramType::Program
    }
}
