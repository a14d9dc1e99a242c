// SPDX-License-Identifier: GPL-3.0-only

//! Frame source abstraction

pub mod camera;
