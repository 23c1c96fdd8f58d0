// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shader modules of the Tracery point buffer protocol.
//!
//! There are two passes. `load` copies the host staging arrays into both
//! halves of the double-buffered point storage, and `advance` rewrites every
//! slot from its previous-frame value through the curve hooks. Each pass is
//! available as WGSL (see [`SHADERS`]) and, with the `cpu` feature, as a Rust
//! function over [`cpu::CpuBinding`]s with the same binding layout.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    missing_debug_implementations,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    reason = "Deferred"
)]

mod types;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use types::BindType;

use std::borrow::Cow;

use tracery_encoding::SLOT_WG;

/// Marker line in the advance template replaced by the hook functions.
const HOOKS_MARKER: &str = "//@hooks";

/// Identity hooks used when a scene supplies none.
pub const DEFAULT_HOOKS_WGSL: &str = "\
fn curve_position(previous: PointData, slot: SlotContext) -> PointData {
    return previous;
}

fn curve_color(previous: ColorData, slot: SlotContext) -> ColorData {
    return previous;
}
";

#[derive(Clone, Debug)]
pub struct ComputeShader<'a> {
    pub name: Cow<'a, str>,
    pub workgroup_size: [u32; 3],
    pub bindings: Cow<'a, [BindType]>,
    #[cfg(feature = "wgsl")]
    pub wgsl: Cow<'a, str>,
}

pub struct Shaders<'a> {
    pub load: ComputeShader<'a>,
    /// Template; see [`advance_wgsl`] for a compilable source.
    pub advance: ComputeShader<'a>,
}

pub const SHADERS: Shaders<'static> = Shaders {
    load: ComputeShader {
        name: Cow::Borrowed("load"),
        workgroup_size: [SLOT_WG, 1, 1],
        bindings: Cow::Borrowed(&[
            BindType::Uniform,
            BindType::BufReadOnly,
            BindType::BufReadOnly,
            BindType::Buffer,
            BindType::Buffer,
            BindType::Buffer,
            BindType::Buffer,
        ]),
        #[cfg(feature = "wgsl")]
        wgsl: Cow::Borrowed(concat!(
            include_str!("../shader/shared.wgsl"),
            include_str!("../shader/load.wgsl")
        )),
    },
    advance: ComputeShader {
        name: Cow::Borrowed("advance"),
        workgroup_size: [SLOT_WG, 1, 1],
        bindings: Cow::Borrowed(&[
            BindType::Uniform,
            BindType::BufReadOnly,
            BindType::BufReadOnly,
            BindType::BufReadOnly,
            BindType::Buffer,
            BindType::Buffer,
        ]),
        #[cfg(feature = "wgsl")]
        wgsl: Cow::Borrowed(concat!(
            include_str!("../shader/shared.wgsl"),
            include_str!("../shader/advance.wgsl")
        )),
    },
};

/// The advance pass with the given hook functions spliced in.
///
/// `hooks` must define `curve_position` and `curve_color`; `None` uses
/// [`DEFAULT_HOOKS_WGSL`]. Hook bodies may read `config`, `counts`,
/// `prev_positions` and `prev_colors`.
#[cfg(feature = "wgsl")]
pub fn advance_wgsl(hooks: Option<&str>) -> String {
    SHADERS
        .advance
        .wgsl
        .replacen(HOOKS_MARKER, hooks.unwrap_or(DEFAULT_HOOKS_WGSL), 1)
}

#[cfg(all(test, feature = "wgsl"))]
mod tests {
    use super::*;

    #[test]
    fn advance_template_splices_hooks() {
        let source = advance_wgsl(None);
        assert!(!source.contains(HOOKS_MARKER));
        assert!(source.contains("fn curve_position"));
        assert!(source.contains("struct SyncConfig"));

        let custom = "fn curve_position(p: PointData, s: SlotContext) -> PointData { return p; }";
        assert!(advance_wgsl(Some(custom)).contains(custom));
    }

    #[test]
    fn binding_counts_match_sources() {
        for shader in [&SHADERS.load, &SHADERS.advance] {
            let declared = shader.wgsl.matches("@binding(").count();
            assert_eq!(declared, shader.bindings.len(), "{}", shader.name);
        }
    }
}
