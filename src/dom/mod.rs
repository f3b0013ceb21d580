// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Static HTML inspection
//!
//! Parses a document with html5ever and reduces it to the elements a policy
//! cares about.

mod element;
mod parser;

pub use element::ObservedElement;
pub use parser::extract_elements;
