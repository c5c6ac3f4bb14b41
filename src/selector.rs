//! Picks the next background under orientation and repeat constraints.

use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::layers::Layer;
use crate::pool::{Image, ImagePool};
use crate::viewport::{Orientation, Viewport, ViewportSource};

/// True when `image` may be shown on `viewport` without an incongruent crop.
pub fn is_orientation_compatible(image: &Image, viewport: Viewport, band: f64) -> bool {
    match viewport.orientation(band) {
        Orientation::NearSquare => true,
        Orientation::Landscape => image.aspect_ratio > band,
        Orientation::Portrait => image.aspect_ratio < 1.0 / band,
    }
}

/// Which constraint had to be relaxed to find a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Compatible and not a repeat.
    None,
    /// Only the excluded image is compatible; repeat it.
    RepeatAllowed,
    /// Nothing fits the viewport orientation; ignore it.
    OrientationIgnored,
    /// A single-image pool that is also incompatible.
    Any,
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Fallback::None => "none",
            Fallback::RepeatAllowed => "repeat-allowed",
            Fallback::OrientationIgnored => "orientation-ignored",
            Fallback::Any => "any",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub image: &'a Image,
    pub fallback: Fallback,
}

pub struct Selector {
    viewport: Arc<dyn ViewportSource>,
    band: f64,
    rng: StdRng,
    next_seq: u64,
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("viewport", &self.viewport.current())
            .field("band", &self.band)
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl Selector {
    /// `band` is the near-square bound `R`; a `seed` makes draws reproducible.
    pub fn new(viewport: Arc<dyn ViewportSource>, band: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            viewport,
            band,
            rng,
            next_seq: 0,
        }
    }

    /// Uniform draw from the most constrained non-empty candidate set.
    ///
    /// Candidates are filtered before sampling, so this always terminates on a
    /// non-empty pool.
    pub fn choose<'a>(&mut self, pool: &'a ImagePool, exclude: Option<&Image>) -> Selection<'a> {
        let viewport = self.viewport.current();
        let band = self.band;
        let images = pool.list_images();
        let fresh = |image: &Image| exclude.is_none_or(|ex| ex.src != image.src);
        let fits = |image: &Image| is_orientation_compatible(image, viewport, band);

        let tiers: [(Fallback, &dyn Fn(&Image) -> bool); 4] = [
            (Fallback::None, &|image| fits(image) && fresh(image)),
            (Fallback::RepeatAllowed, &fits),
            (Fallback::OrientationIgnored, &fresh),
            (Fallback::Any, &|_| true),
        ];

        for (fallback, accept) in tiers {
            let candidates: Vec<&Image> = images.iter().filter(|image| accept(image)).collect();
            if let Some(&image) = candidates.choose(&mut self.rng) {
                if fallback != Fallback::None {
                    warn!(
                        %fallback,
                        src = %image.src,
                        viewport_ratio = viewport.ratio(),
                        "selection constraints relaxed"
                    );
                }
                return Selection { image, fallback };
            }
        }
        unreachable!("image pool is never empty")
    }

    /// Draw a new plain layer.
    pub fn pick_next(&mut self, pool: &ImagePool, exclude: Option<&Image>) -> Layer {
        let image = self.choose(pool, exclude).image.clone();
        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(src = %image.src, seq, "picked next background");
        Layer::new(image, seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::AccentColors;
    use crate::viewport::{DEFAULT_ORIENTATION_RATIO, FixedViewport, SharedViewport};

    fn image(src: &str, aspect_ratio: f64) -> Image {
        Image {
            src: src.into(),
            aspect_ratio,
            colors: AccentColors::uniform("#808080"),
        }
    }

    fn selector(width: f64, height: f64, seed: u64) -> Selector {
        Selector::new(
            Arc::new(FixedViewport(Viewport::new(width, height))),
            DEFAULT_ORIENTATION_RATIO,
            Some(seed),
        )
    }

    #[test]
    fn square_viewport_accepts_everything() {
        let square = Viewport::new(1000.0, 1000.0);
        assert!(is_orientation_compatible(&image("wide", 3.0), square, DEFAULT_ORIENTATION_RATIO));
        assert!(is_orientation_compatible(&image("tall", 0.3), square, DEFAULT_ORIENTATION_RATIO));
    }

    #[test]
    fn landscape_viewport_rejects_portrait_images() {
        let wide = Viewport::new(2000.0, 1000.0);
        assert!(is_orientation_compatible(&image("l", 2.5), wide, DEFAULT_ORIENTATION_RATIO));
        assert!(!is_orientation_compatible(&image("p", 0.5), wide, DEFAULT_ORIENTATION_RATIO));
        assert!(!is_orientation_compatible(&image("s", 1.0), wide, DEFAULT_ORIENTATION_RATIO));
    }

    #[test]
    fn portrait_viewport_accepts_only_portrait_images() {
        let tall = Viewport::new(1000.0, 2000.0);
        assert!(is_orientation_compatible(&image("p", 0.5), tall, DEFAULT_ORIENTATION_RATIO));
        assert!(!is_orientation_compatible(&image("l", 2.5), tall, DEFAULT_ORIENTATION_RATIO));
    }

    #[test]
    fn never_repeats_when_alternatives_exist() {
        let pool = ImagePool::new(vec![
            image("a", 1.6),
            image("b", 1.7),
            image("c", 1.8),
            image("tall", 0.5),
        ])
        .unwrap();
        let mut selector = selector(1920.0, 1080.0, 7);
        let excluded = pool.list_images()[0].clone();
        for _ in 0..200 {
            let picked = selector.choose(&pool, Some(&excluded));
            assert_eq!(picked.fallback, Fallback::None);
            assert_ne!(picked.image.src, "a");
            assert_ne!(picked.image.src, "tall");
        }
    }

    #[test]
    fn single_image_pool_repeats_instead_of_looping() {
        let pool = ImagePool::new(vec![image("only", 1.0)]).unwrap();
        let mut selector = selector(1000.0, 1000.0, 1);
        let only = pool.list_images()[0].clone();
        let picked = selector.choose(&pool, Some(&only));
        assert_eq!(picked.image.src, "only");
        assert_eq!(picked.fallback, Fallback::RepeatAllowed);
    }

    #[test]
    fn incompatible_pool_ignores_orientation() {
        let pool = ImagePool::new(vec![image("p1", 0.5), image("p2", 0.6)]).unwrap();
        let mut selector = selector(1920.0, 1080.0, 3);
        let first = pool.list_images()[0].clone();
        for _ in 0..50 {
            let picked = selector.choose(&pool, Some(&first));
            assert_eq!(picked.fallback, Fallback::OrientationIgnored);
            assert_eq!(picked.image.src, "p2");
        }

        let single = ImagePool::new(vec![image("p1", 0.5)]).unwrap();
        let picked = selector.choose(&single, Some(&first));
        assert_eq!(picked.fallback, Fallback::Any);
    }

    #[test]
    fn viewport_is_read_on_every_pick() {
        let shared = SharedViewport::new(Viewport::new(1920.0, 1080.0));
        let mut selector = Selector::new(Arc::new(shared.clone()), DEFAULT_ORIENTATION_RATIO, Some(11));
        let pool = ImagePool::new(vec![image("wide", 2.0), image("tall", 0.5)]).unwrap();

        assert_eq!(selector.pick_next(&pool, None).src(), "wide");
        shared.resize(1080.0, 1920.0);
        assert_eq!(selector.pick_next(&pool, None).src(), "tall");
    }

    #[test]
    fn layers_get_increasing_sequence_numbers() {
        let pool = ImagePool::new(vec![image("a", 1.0), image("b", 1.0)]).unwrap();
        let mut selector = selector(1000.0, 1000.0, 5);
        let first = selector.pick_next(&pool, None);
        let second = selector.pick_next(&pool, Some(&first.image));
        assert!(second.seq > first.seq);
        assert_ne!(first.src(), second.src());
    }
}
