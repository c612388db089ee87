//! Reference couloirs loaded into an empty or reset store.

use crate::terrain::Aspect;

use super::point::PointData;

struct SeedCouloir {
    name: &'static str,
    latitude: f64,
    longitude: f64,
    aspect: Aspect,
    elevation_max: i32,
    elevation_min: i32,
    slope_angle: f64,
    ski_grade: &'static str,
    ski_exposure_grade: &'static str,
    reference_link: &'static str,
    owner: &'static str,
}

const SEED: [SeedCouloir; 6] = [
    SeedCouloir {
        name: "Couloir E du Portalet",
        latitude: 46.007,
        longitude: 7.042,
        aspect: Aspect::E,
        elevation_max: 3344,
        elevation_min: 2344,
        slope_angle: 43.0,
        ski_grade: "4.3",
        ski_exposure_grade: "E2",
        reference_link: "https://www.camptocamp.org/routes/160967/fr/le-portalet-couloir-e",
        owner: "AK",
    },
    SeedCouloir {
        name: "Couloir de Bel Oiseau",
        latitude: 46.062,
        longitude: 6.929,
        aspect: Aspect::NE,
        elevation_max: 2525,
        elevation_min: 1725,
        slope_angle: 43.0,
        ski_grade: "4.3",
        ski_exposure_grade: "E2",
        reference_link: "https://www.camptocamp.org/routes/115525/fr/bel-oiseau-couloir-ene",
        owner: "MJ",
    },
    SeedCouloir {
        name: "L'aile et la rampe de la colombe",
        latitude: 46.168,
        longitude: 6.749,
        aspect: Aspect::NE,
        elevation_max: 2406,
        elevation_min: 1806,
        slope_angle: 42.0,
        ski_grade: "4.2",
        ski_exposure_grade: "E2",
        reference_link: "https://www.camptocamp.org/routes/732886/fr/tete-de-bossetan-bostan-l-aile-de-la-colombe",
        owner: "MJ",
    },
    SeedCouloir {
        name: "Rampe des chamois",
        latitude: 46.168,
        longitude: 6.746,
        aspect: Aspect::N,
        elevation_max: 2406,
        elevation_min: 1706,
        slope_angle: 43.0,
        ski_grade: "4.3",
        ski_exposure_grade: "E3",
        reference_link: "https://www.camptocamp.org/routes/732887/fr/tete-de-bossetan-bostan-rampe-des-chamois",
        owner: "AK",
    },
    SeedCouloir {
        name: "Couloirs du Bürglen",
        latitude: 46.875,
        longitude: 8.628,
        aspect: Aspect::S,
        elevation_max: 2165,
        elevation_min: 1665,
        slope_angle: 41.0,
        ski_grade: "4.1",
        ski_exposure_grade: "E1",
        reference_link: "https://www.camptocamp.org/routes/47398/fr/burglen-couloirs-ne",
        owner: "MJ",
    },
    SeedCouloir {
        name: "Couloir de la Table (Aiguille du Tour)",
        latitude: 45.983,
        longitude: 7.005,
        aspect: Aspect::S,
        elevation_max: 3540,
        elevation_min: 2940,
        slope_angle: 43.0,
        ski_grade: "4.3",
        ski_exposure_grade: "E2",
        reference_link: "https://www.camptocamp.org/routes/46737/fr/aiguille-du-tour-couloir-de-la-table",
        owner: "AK",
    },
];

/// The reference couloirs, in insertion order.
pub fn reference_couloirs() -> Vec<PointData> {
    SEED.iter()
        .map(|c| PointData {
            name: c.name.to_string(),
            latitude: c.latitude,
            longitude: c.longitude,
            aspect: c.aspect,
            elevation_max: c.elevation_max,
            elevation_min: Some(c.elevation_min),
            slope_angle: c.slope_angle,
            ski_grade: c.ski_grade.to_string(),
            ski_exposure_grade: c.ski_exposure_grade.to_string(),
            comment: String::new(),
            reference_link: c.reference_link.to_string(),
            owner: c.owner.to_string(),
        })
        .collect()
}
