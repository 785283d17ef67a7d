//! One `kube::runtime::Controller` per reconciled CRD.
//!
//! Each submodule owns a `run` function that builds its `Api`, wires `reconcile`/`error_policy`
//! into a `Controller`, and drives it to completion (or until cancellation). `main` spawns all of
//! them as concurrent tasks.

pub mod eviction;
pub mod placement;
pub mod update_run;
pub mod work;
