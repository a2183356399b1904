// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Top-level configuration layer, one per source.

use serde::{Deserialize, Serialize};

use crate::segment::SegmentConfigLayer;

/// Everything a single source contributes. Sections a source does not
/// mention stay `None` and leave lower-precedence values in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TallyConfigLayer {
	pub segment: Option<SegmentConfigLayer>,
}

impl TallyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		match (&mut self.segment, other.segment) {
			(Some(base), Some(overlay)) => base.merge(overlay),
			(None, Some(overlay)) => self.segment = Some(overlay),
			(_, None) => {}
		}
	}
}
