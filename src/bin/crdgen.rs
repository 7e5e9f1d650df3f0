// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Generate the CRD manifests for all operator resources.
//!
//! Prints the four CustomResourceDefinitions as a multi-document YAML stream
//! on stdout, suitable for `kubectl apply -f -`.

use kube::CustomResourceExt;
use pdns_operator::crd::{ClusterRRset, ClusterZone, RRset, Zone};

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&Zone::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&ClusterZone::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&RRset::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&ClusterRRset::crd())?);
    Ok(())
}
