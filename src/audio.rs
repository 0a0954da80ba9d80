//! The DJ crate: a fixed catalog of playlists/podcasts keyed by misery tier.
//!
//! The catalog ships embedded in the binary (`audio_crate.json`) and is
//! validated non-empty per tier when application state is built. Selection
//! takes any `Rng`, so the service uses `rand::rng()` while tests inject a
//! seeded `StdRng` for reproducible picks.

use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::score::Tier;

static BUILTIN_CRATE: Lazy<AudioCatalog> = Lazy::new(|| {
    let raw = include_str!("../audio_crate.json");
    serde_json::from_str::<AudioCatalog>(raw).expect("valid audio crate json")
});

/// One recommendable entry: display title plus a streaming link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPick {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioCatalog {
    #[serde(rename = "Chill")]
    chill: Vec<AudioPick>,
    #[serde(rename = "Medium")]
    medium: Vec<AudioPick>,
    #[serde(rename = "Rage")]
    rage: Vec<AudioPick>,
}

impl AudioCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> &'static AudioCatalog {
        &BUILTIN_CRATE
    }

    /// Startup invariant: every tier must have at least one entry.
    pub fn validate(&self) -> anyhow::Result<()> {
        for tier in [Tier::Chill, Tier::Medium, Tier::Rage] {
            if self.bucket(tier).is_empty() {
                anyhow::bail!("audio catalog has no entries for tier {}", tier.as_str());
            }
        }
        Ok(())
    }

    pub fn bucket(&self, tier: Tier) -> &[AudioPick] {
        match tier {
            Tier::Chill => &self.chill,
            Tier::Medium => &self.medium,
            Tier::Rage => &self.rage,
        }
    }
}

/// Uniform random pick from the tier bucket the score maps to.
pub fn select_audio<'a, R: Rng + ?Sized>(
    catalog: &'a AudioCatalog,
    score: u32,
    rng: &mut R,
) -> &'a AudioPick {
    let bucket = catalog.bucket(Tier::from_score(score));
    bucket
        .choose(rng)
        .expect("audio catalog buckets validated non-empty at startup")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn builtin_catalog_passes_validation() {
        AudioCatalog::builtin().validate().expect("builtin catalog");
    }

    #[test]
    fn empty_bucket_fails_validation() {
        let broken = AudioCatalog {
            chill: Vec::new(),
            medium: vec![AudioPick {
                title: "t".into(),
                link: "l".into(),
            }],
            rage: vec![AudioPick {
                title: "t".into(),
                link: "l".into(),
            }],
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn picks_stay_inside_the_score_tier_bucket() {
        let catalog = AudioCatalog::builtin();
        let mut rng = StdRng::seed_from_u64(42);
        for (score, tier) in [(0, Tier::Chill), (15, Tier::Medium), (30, Tier::Rage)] {
            let bucket = catalog.bucket(tier);
            for _ in 0..200 {
                let pick = select_audio(catalog, score, &mut rng);
                assert!(
                    bucket.contains(pick),
                    "pick {:?} escaped the {} bucket",
                    pick,
                    tier.as_str()
                );
            }
        }
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let catalog = AudioCatalog::builtin();
        let a = select_audio(catalog, 25, &mut StdRng::seed_from_u64(7)).clone();
        let b = select_audio(catalog, 25, &mut StdRng::seed_from_u64(7)).clone();
        assert_eq!(a, b);
    }
}
