// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use strata::{decode_schema, encode_schema, Direction, Schema, SchemaBinder};

fuzz_target!(|data: &[u8]| {
    // Schema descriptions arrive from untrusted peers.
    let Ok(remote) = decode_schema(data) else {
        return;
    };

    // A decoded schema re-encodes to an equal schema.
    if let Ok(bytes) = encode_schema(&remote) {
        if let Ok(again) = decode_schema(&bytes) {
            assert_eq!(again, remote);
        }
    }

    // Binding against itself never fails.
    let local: Schema = remote.clone();
    assert!(SchemaBinder::new(local).bind(&remote, Direction::Both).is_ok());
});
