// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `@handle` mentions in answer bodies.

use gluru_server_auth::{DirectoryLookup, Principal};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// A mention starts a word; `user@example.com` is not a mention.
static MENTION_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?:^|[^\w@])@([A-Za-z0-9][A-Za-z0-9_.-]*)").unwrap());

/// Distinct handles in order of first appearance, without the `@`.
pub fn extract_mentions(body: &str) -> Vec<String> {
	let mut seen = BTreeSet::new();
	MENTION_REGEX
		.captures_iter(body)
		.filter_map(|caps| caps.get(1))
		.map(|m| m.as_str().trim_end_matches(['.', '-']).to_string())
		.filter(|handle| seen.insert(handle.clone()))
		.collect()
}

/// Resolves every mention in `body`. Unknown handles and lookup failures are
/// logged and skipped.
pub async fn resolve_mentions(body: &str, directory: &dyn DirectoryLookup) -> Vec<Principal> {
	let mut resolved = Vec::new();
	for handle in extract_mentions(body) {
		match directory.resolve_mention(&handle).await {
			Ok(Some(principal)) => resolved.push(principal),
			Ok(None) => tracing::warn!(tag = %handle, "mentioned handle did not resolve"),
			Err(e) => tracing::warn!(tag = %handle, error = %e, "mention lookup failed"),
		}
	}
	resolved
}
