// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-entity policies for principals that are neither superuser nor staff.

pub mod answer;
pub mod company;
pub mod info;
pub mod ticket;
