// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_known_engines() {
    assert_eq!("libretranslate".parse::<Engine>().unwrap(), Engine::LibreTranslate);
    assert_eq!("argos".parse::<Engine>().unwrap(), Engine::Argos);
    assert_eq!("Argos".parse::<Engine>().unwrap(), Engine::Argos);
    assert_eq!("LIBRETRANSLATE".parse::<Engine>().unwrap(), Engine::LibreTranslate);
}

#[test]
fn rejects_unknown_engine() {
    let err = "vllm".parse::<Engine>().unwrap_err();
    assert!(err.to_string().contains("unknown engine type"));
}

#[test]
fn display_matches_tag() {
    assert_eq!(Engine::LibreTranslate.to_string(), "libretranslate");
    assert_eq!(Engine::Argos.to_string(), "argos");
}
