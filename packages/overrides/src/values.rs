//! # Value Comparators & Cloners
//!
//! Type-aware equality and deep-copy for the small set of mutable property
//! kinds. Equality compares significant fields only (a solid paint is its
//! color channels and opacity, an image paint is its resource hash and
//! scale mode). Property maps use key-set equality one level deep: same
//! keys, equal scalar values; the wrapper kind is not compared. Cloning is
//! explicit per value kind, never a generic deep copy of unknown shape.

use std::collections::BTreeMap;
use stencil_document::{ComponentValue, FontRef, GradientStop, Paint};

const EPSILON: f32 = 1e-6;

pub(crate) fn nearly_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Structural equality of two paint lists, in order.
pub fn paints_equal(a: &[Paint], b: &[Paint]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(pa, pb)| paint_equal(pa, pb))
}

fn paint_equal(a: &Paint, b: &Paint) -> bool {
    match (a, b) {
        (
            Paint::Solid {
                color: ca,
                opacity: oa,
            },
            Paint::Solid {
                color: cb,
                opacity: ob,
            },
        ) => {
            nearly_eq(ca.r, cb.r)
                && nearly_eq(ca.g, cb.g)
                && nearly_eq(ca.b, cb.b)
                && nearly_eq(ca.a, cb.a)
                && nearly_eq(*oa, *ob)
        }
        (
            Paint::Image {
                hash: ha,
                scale_mode: sa,
            },
            Paint::Image {
                hash: hb,
                scale_mode: sb,
            },
        ) => ha == hb && sa == sb,
        (
            Paint::Gradient {
                stops: sa,
                opacity: oa,
            },
            Paint::Gradient {
                stops: sb,
                opacity: ob,
            },
        ) => {
            nearly_eq(*oa, *ob)
                && sa.len() == sb.len()
                && sa.iter().zip(sb).all(|(x, y)| {
                    nearly_eq(x.position, y.position)
                        && nearly_eq(x.color.r, y.color.r)
                        && nearly_eq(x.color.g, y.color.g)
                        && nearly_eq(x.color.b, y.color.b)
                        && nearly_eq(x.color.a, y.color.a)
                })
        }
        _ => false,
    }
}

/// Font identity: family plus style.
pub fn fonts_equal(a: &FontRef, b: &FontRef) -> bool {
    a.family == b.family && a.style == b.style
}

/// Key-set equality for component-parameter maps, one level deep: equal iff
/// the key sets match and the scalar value under each key is equal.
pub fn params_equal(
    a: &BTreeMap<String, ComponentValue>,
    b: &BTreeMap<String, ComponentValue>,
) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, va)| b.get(k).map_or(false, |vb| va.value == vb.value))
}

/// Explicit per-kind paint copy.
pub fn clone_paints(paints: &[Paint]) -> Vec<Paint> {
    paints
        .iter()
        .map(|paint| match paint {
            Paint::Solid { color, opacity } => Paint::Solid {
                color: *color,
                opacity: *opacity,
            },
            Paint::Image { hash, scale_mode } => Paint::Image {
                hash: hash.clone(),
                scale_mode: *scale_mode,
            },
            Paint::Gradient { stops, opacity } => Paint::Gradient {
                stops: stops
                    .iter()
                    .map(|s| GradientStop {
                        position: s.position,
                        color: s.color,
                    })
                    .collect(),
                opacity: *opacity,
            },
        })
        .collect()
}

pub fn clone_font(font: &FontRef) -> FontRef {
    FontRef::new(font.family.clone(), font.style.clone())
}

pub fn clone_params(map: &BTreeMap<String, ComponentValue>) -> BTreeMap<String, ComponentValue> {
    map.iter()
        .map(|(k, v)| {
            (
                k.clone(),
                ComponentValue::new(v.value.clone(), v.kind),
            )
        })
        .collect()
}

pub fn clone_variants(map: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_document::{ParamValue, Rgba, ScaleMode};

    #[test]
    fn test_solid_paints_compare_channels() {
        let red = Paint::solid(1.0, 0.0, 0.0);
        let also_red = Paint::solid(1.0, 0.0, 0.0);
        let blue = Paint::solid(0.0, 0.0, 1.0);

        assert!(paints_equal(&[red.clone()], &[also_red]));
        assert!(!paints_equal(&[red.clone()], &[blue]));
        assert!(!paints_equal(&[red], &[]));
    }

    #[test]
    fn test_image_paints_compare_hash_and_scale() {
        let a = Paint::Image {
            hash: "abc".to_string(),
            scale_mode: ScaleMode::Fill,
        };
        let b = Paint::Image {
            hash: "abc".to_string(),
            scale_mode: ScaleMode::Fit,
        };
        assert!(!paints_equal(&[a.clone()], &[b]));
        assert!(paints_equal(&[a.clone()], &[a]));
    }

    #[test]
    fn test_mismatched_paint_kinds_unequal() {
        let solid = Paint::solid(0.0, 0.0, 0.0);
        let image = Paint::Image {
            hash: "abc".to_string(),
            scale_mode: ScaleMode::Fill,
        };
        assert!(!paints_equal(&[solid], &[image]));
    }

    #[test]
    fn test_params_equal_is_one_level_deep() {
        let mut a = BTreeMap::new();
        a.insert("label".to_string(), ComponentValue::text("Hi"));
        let mut b = BTreeMap::new();
        b.insert("label".to_string(), ComponentValue::text("Hi"));

        assert!(params_equal(&a, &b));

        b.insert("extra".to_string(), ComponentValue::bool(true));
        assert!(!params_equal(&a, &b));

        b.remove("extra");
        b.insert("label".to_string(), ComponentValue::text("Bye"));
        assert!(!params_equal(&a, &b));
    }

    #[test]
    fn test_params_equal_ignores_wrapper_kind() {
        let mut a = BTreeMap::new();
        a.insert(
            "state".to_string(),
            ComponentValue::new(
                ParamValue::Text("on".to_string()),
                stencil_document::ParamKind::Variant,
            ),
        );
        let mut b = BTreeMap::new();
        b.insert("state".to_string(), ComponentValue::text("on"));
        assert!(params_equal(&a, &b));
    }

    #[test]
    fn test_clones_are_independent() {
        let paints = vec![Paint::Gradient {
            stops: vec![GradientStop {
                position: 0.0,
                color: Rgba::new(1.0, 0.0, 0.0, 1.0),
            }],
            opacity: 1.0,
        }];
        let copy = clone_paints(&paints);
        assert!(paints_equal(&paints, &copy));

        let font = FontRef::new("Inter", "Bold");
        assert!(fonts_equal(&font, &clone_font(&font)));
    }
}
