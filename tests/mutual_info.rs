/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate lib_whippet;

use lib_whippet::MutInfo;

const DATASET: &str = "A,B,C
0,1,0
0,1,1
0,0,1
1,1,1
0,1,0";

// hand-computed empirical values (natural log) for the dataset above
const EXPECTED: [[f64; 3]; 3] = [
    [0.50040242353, 0.05053430783, 0.11849392254],
    [0.05053430783, 0.50040242353, 0.11849392254],
    [0.11849392254, 0.11849392254, 0.673011667],
];

#[cfg(test)]
#[test]
fn test_compute_from_dataset() {
    let mi = MutInfo::from_dataset(DATASET.as_bytes()).unwrap();
    assert_eq!(mi.nvar(), 3);
    for i in 0..3 {
        for j in 0..3 {
            assert!(
                (mi.get(i, j) - EXPECTED[i][j]).abs() < 1e-9,
                "wrong mi[{}][{}]: {} != {}",
                i,
                j,
                mi.get(i, j),
                EXPECTED[i][j]
            );
        }
    }
}

#[test]
fn test_symmetry() {
    let mi = MutInfo::from_dataset(DATASET.as_bytes()).unwrap();
    for i in 0..mi.nvar() {
        for j in 0..mi.nvar() {
            assert_eq!(mi.get(i, j), mi.get(j, i));
        }
    }
}

#[test]
fn test_write_read_round_trip() {
    let mi = MutInfo::from_dataset(DATASET.as_bytes()).unwrap();
    let mut buf: Vec<u8> = Vec::new();
    mi.write(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let reread = MutInfo::read(text.as_bytes()).unwrap();
    assert_eq!(reread.nvar(), mi.nvar());
    for i in 0..mi.nvar() {
        for j in 0..=i {
            assert!(
                (reread.get(i, j) - mi.get(i, j)).abs() < 1e-9,
                "round trip drifted at [{}][{}]",
                i,
                j
            );
        }
    }
}

#[test]
fn test_read_fixed_matrix() {
    let text = "0.50\n0.05 0.50\n0.11 0.11 0.67\n0.11 0.11 0.67 0.70\n";
    let mi = MutInfo::read(text.as_bytes()).unwrap();
    assert_eq!(mi.nvar(), 4);
    assert_eq!(mi.get(0, 1), 0.05);
    assert_eq!(mi.get(1, 0), 0.05);
    assert_eq!(mi.get(3, 2), 0.67);
    assert_eq!(mi.get(3, 3), 0.70);
}

#[test]
fn test_malformed_inputs() {
    // not lower triangular
    assert!(MutInfo::read("0.5 0.3\n0.1 0.2\n".as_bytes()).is_err());
    // empty
    assert!(MutInfo::read("".as_bytes()).is_err());
    // ragged dataset row
    assert!(MutInfo::from_dataset("A,B\n0,1\n0\n".as_bytes()).is_err());
    // non-integer state
    assert!(MutInfo::from_dataset("A,B\n0,x\n".as_bytes()).is_err());
}
