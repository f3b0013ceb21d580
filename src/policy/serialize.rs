// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Policy text format: `name src src; name src;`

use tracing::warn;

use super::directives::DirectiveMap;
use crate::error::ErrorCode;

impl DirectiveMap {
    /// Serialize to header text.
    ///
    /// Directives without sources are omitted. The result ends with `;`
    /// unless nothing was emitted.
    pub fn to_policy_string(&self) -> String {
        let parts: Vec<String> = self
            .iter()
            .filter(|(_, sources)| !sources.is_empty())
            .map(|(name, sources)| format!("{} {}", name, sources.join(" ")))
            .collect();

        if parts.is_empty() {
            return String::new();
        }
        format!("{};", parts.join("; "))
    }

    /// Parse header text produced by [`DirectiveMap::to_policy_string`] or
    /// sent by a server.
    ///
    /// Blank clauses are skipped, a name with no sources is kept with an
    /// empty list and a repeated directive keeps its first occurrence.
    pub fn parse_policy(text: &str) -> DirectiveMap {
        let mut map = DirectiveMap::new();

        if text.trim().is_empty() {
            warn!(
                operation = "parse_policy",
                error_code = %ErrorCode::InvalidCsp,
                "Empty policy text"
            );
            return map;
        }

        let clauses: Vec<&str> = text.split(';').collect();
        let last = clauses.len() - 1;

        for (idx, clause) in clauses.into_iter().enumerate() {
            let mut tokens = clause.split_whitespace();
            let name = match tokens.next() {
                Some(name) => name,
                None => {
                    // trailing ';' leaves one empty clause behind
                    if idx != last {
                        warn!(
                            operation = "parse_policy",
                            clause_index = idx,
                            error_code = %ErrorCode::InvalidCsp,
                            "Skipping empty policy clause"
                        );
                    }
                    continue;
                }
            };

            if map.contains(name) {
                warn!(
                    operation = "parse_policy",
                    directive = name,
                    error_code = %ErrorCode::InvalidCsp,
                    "Duplicate directive ignored"
                );
                continue;
            }
            map.set(name, tokens);
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_policy_string() {
        let map: DirectiveMap = vec![
            ("default-src", vec!["'self'"]),
            ("style-src-attr", vec![]),
            ("object-src", vec!["'none'"]),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.to_policy_string(), "default-src 'self'; object-src 'none';");
    }

    #[test]
    fn test_empty_map_serializes_empty() {
        assert_eq!(DirectiveMap::new().to_policy_string(), "");
    }

    #[test]
    fn test_parse_policy() {
        let map = DirectiveMap::parse_policy(
            "default-src 'self'; script-src 'self' https://cdn.example.com;",
        );
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get("script-src").unwrap(),
            ["'self'".to_string(), "https://cdn.example.com".to_string()]
        );
    }

    #[test]
    fn test_parse_skips_blank_clauses() {
        let map = DirectiveMap::parse_policy("default-src 'self';  ; ;img-src  *");
        let names: Vec<&str> = map.names().collect();
        assert_eq!(names, vec!["default-src", "img-src"]);
        assert_eq!(map.get("img-src").unwrap(), ["*".to_string()]);
    }

    #[test]
    fn test_parse_name_only_clause() {
        let map = DirectiveMap::parse_policy("upgrade-insecure-requests; default-src 'self'");
        assert!(map.contains("upgrade-insecure-requests"));
        assert!(map.get("upgrade-insecure-requests").unwrap().is_empty());
    }

    #[test]
    fn test_parse_duplicate_keeps_first() {
        let map = DirectiveMap::parse_policy("script-src 'self'; script-src *;");
        assert_eq!(map.get("script-src").unwrap(), ["'self'".to_string()]);
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(DirectiveMap::parse_policy("   ").is_empty());
    }

    #[test]
    fn test_round_trip() {
        let map: DirectiveMap = vec![
            ("default-src", vec!["'self'"]),
            ("script-src", vec!["'self'", "'sha256-abc'", "https://x.example"]),
        ]
        .into_iter()
        .collect();
        let parsed = DirectiveMap::parse_policy(&map.to_policy_string());
        assert_eq!(parsed, map);
        assert_eq!(parsed.to_policy_string(), map.to_policy_string());
    }
}
