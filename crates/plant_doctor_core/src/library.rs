//! crates/plant_doctor_core/src/library.rs
//!
//! The read-only plant encyclopedia shown alongside diagnoses.

use std::sync::OnceLock;

use crate::domain::{CareLevel, LibraryPlant};

struct Entry {
    id: &'static str,
    name: &'static str,
    scientific_name: &'static str,
    category: &'static str,
    care_level: CareLevel,
    light: &'static str,
    water: &'static str,
    soil: &'static str,
    common_issues: &'static [&'static str],
    description: &'static str,
    image: &'static str,
}

const ENTRIES: &[Entry] = &[
    Entry {
        id: "1",
        name: "Monstera Deliciosa",
        scientific_name: "Monstera deliciosa",
        category: "Tropical",
        care_level: CareLevel::Moderate,
        light: "Bright, indirect sunlight",
        water: "Every 1-2 weeks, allowing soil to dry out between waterings",
        soil: "Well-draining potting mix with peat moss",
        common_issues: &[
            "Yellowing leaves (overwatering)",
            "Brown edges (low humidity)",
            "Small leaves (low light)",
        ],
        description: "Famous for its natural leaf holes, the Monstera is a stunning climber that brings a tropical feel to any room.",
        image: "https://images.unsplash.com/photo-1614594975525-e45190c55d0b?auto=format&fit=crop&q=80&w=800",
    },
    Entry {
        id: "2",
        name: "Snake Plant",
        scientific_name: "Dracaena trifasciata",
        category: "Succulent",
        care_level: CareLevel::Easy,
        light: "Any light from low to bright indirect",
        water: "Every 2-4 weeks, soil must be completely dry",
        soil: "Cactus or succulent mix",
        common_issues: &[
            "Root rot (too much water)",
            "Mushy leaves (extreme overwatering)",
            "Wrinkled leaves (very thirsty)",
        ],
        description: "One of the hardiest plants available. Excellent for air purification and nearly impossible to kill.",
        image: "https://images.unsplash.com/photo-1593482892290-f54927ae1bf7?auto=format&fit=crop&q=80&w=800",
    },
    Entry {
        id: "3",
        name: "Fiddle Leaf Fig",
        scientific_name: "Ficus lyrata",
        category: "Tree",
        care_level: CareLevel::Challenging,
        light: "Consistent bright, indirect light",
        water: "Weekly, keep soil moist but not soggy",
        soil: "Well-draining, nutrient-rich potting soil",
        common_issues: &[
            "Leaf drop (sudden environment change)",
            "Brown spots (root rot or bacterial infection)",
            "Pale leaves (lack of nutrients)",
        ],
        description: "Known for its large, violin-shaped leaves. It is beautiful but can be temperamental about its environment.",
        image: "https://images.unsplash.com/photo-1545239351-ef35f43d514b?auto=format&fit=crop&q=80&w=800",
    },
    Entry {
        id: "4",
        name: "Spider Plant",
        scientific_name: "Chlorophytum comosum",
        category: "Hanging",
        care_level: CareLevel::Easy,
        light: "Bright to moderate indirect light",
        water: "Once a week, soil should dry slightly",
        soil: "Standard potting mix",
        common_issues: &[
            "Brown leaf tips (fluoride in water)",
            "Fading color (too much direct sun)",
            "Sparse growth (needs repotting)",
        ],
        description: "Produces small \"pups\" that hang down like spiders on a web. Very adaptable and great for beginners.",
        image: "https://images.unsplash.com/photo-1545241047-6083a3684587?auto=format&fit=crop&q=80&w=800",
    },
    Entry {
        id: "5",
        name: "Peace Lily",
        scientific_name: "Spathiphyllum",
        category: "Flowering",
        care_level: CareLevel::Moderate,
        light: "Low to medium indirect light",
        water: "Keep soil moist, will \"wilt\" when thirsty",
        soil: "Rich, well-draining potting soil",
        common_issues: &[
            "Brown tips (dry air)",
            "Yellow leaves (too much sun)",
            "No blooms (not enough light)",
        ],
        description: "Elegant white flowers and deep green foliage. It is excellent at communicating its water needs.",
        image: "https://images.unsplash.com/photo-1593691509543-c55fb32e7355?auto=format&fit=crop&q=80&w=800",
    },
    Entry {
        id: "6",
        name: "Aloe Vera",
        scientific_name: "Aloe barbadensis miller",
        category: "Succulent",
        care_level: CareLevel::Easy,
        light: "Bright, direct sunlight",
        water: "Every 2-3 weeks, allow soil to dry completely",
        soil: "Well-draining succulent mix",
        common_issues: &[
            "Soft stems (overwatering)",
            "Thin leaves (underwatering)",
            "Brown leaves (excessive direct heat)",
        ],
        description: "A useful succulent known for the medicinal properties of the gel inside its thick leaves.",
        image: "https://images.unsplash.com/photo-1596547609652-9cf5d8d76921?auto=format&fit=crop&q=80&w=800",
    },
];

impl Entry {
    fn to_domain(&self) -> LibraryPlant {
        LibraryPlant {
            id: self.id.to_string(),
            name: self.name.to_string(),
            scientific_name: self.scientific_name.to_string(),
            category: self.category.to_string(),
            care_level: self.care_level,
            light: self.light.to_string(),
            water: self.water.to_string(),
            soil: self.soil.to_string(),
            common_issues: self.common_issues.iter().map(|s| s.to_string()).collect(),
            description: self.description.to_string(),
            image: self.image.to_string(),
        }
    }
}

/// Every plant in the encyclopedia, in display order.
pub fn all() -> &'static [LibraryPlant] {
    static PLANTS: OnceLock<Vec<LibraryPlant>> = OnceLock::new();
    PLANTS.get_or_init(|| ENTRIES.iter().map(Entry::to_domain).collect())
}

pub fn find(id: &str) -> Option<&'static LibraryPlant> {
    all().iter().find(|p| p.id == id)
}

/// Plants whose category matches, ignoring case.
pub fn by_category(category: &str) -> Vec<&'static LibraryPlant> {
    all()
        .iter()
        .filter(|p| p.category.eq_ignore_ascii_case(category))
        .collect()
}
