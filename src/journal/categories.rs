use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Pain,
    Digestive,
    Respiratory,
    Mental,
    Sleep,
    Energy,
    Skin,
    Other,
}

impl Category {
    pub fn info(self) -> &'static SymptomCategory {
        let index = match self {
            Category::Pain => 0,
            Category::Digestive => 1,
            Category::Respiratory => 2,
            Category::Mental => 3,
            Category::Sleep => 4,
            Category::Energy => 5,
            Category::Skin => 6,
            Category::Other => 7,
        };
        &CATEGORIES[index]
    }

    pub fn display_name(self) -> &'static str {
        self.info().name
    }
}

/// Static reference data for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SymptomCategory {
    pub id: Category,
    pub name: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

pub static CATEGORIES: [SymptomCategory; 8] = [
    SymptomCategory {
        id: Category::Pain,
        name: "Pain & Discomfort",
        color: "bg-red-100 text-red-800",
        icon: "Zap",
    },
    SymptomCategory {
        id: Category::Digestive,
        name: "Digestive",
        color: "bg-orange-100 text-orange-800",
        icon: "Stomach",
    },
    SymptomCategory {
        id: Category::Respiratory,
        name: "Respiratory",
        color: "bg-blue-100 text-blue-800",
        icon: "Wind",
    },
    SymptomCategory {
        id: Category::Mental,
        name: "Mental Health",
        color: "bg-purple-100 text-purple-800",
        icon: "Brain",
    },
    SymptomCategory {
        id: Category::Sleep,
        name: "Sleep",
        color: "bg-indigo-100 text-indigo-800",
        icon: "Moon",
    },
    SymptomCategory {
        id: Category::Energy,
        name: "Energy",
        color: "bg-yellow-100 text-yellow-800",
        icon: "Battery",
    },
    SymptomCategory {
        id: Category::Skin,
        name: "Skin",
        color: "bg-pink-100 text-pink-800",
        icon: "Sparkles",
    },
    SymptomCategory {
        id: Category::Other,
        name: "Other",
        color: "bg-gray-100 text-gray-800",
        icon: "MoreHorizontal",
    },
];
