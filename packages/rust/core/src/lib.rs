//! Aggregation stages for ligbench.
//!
//! Each stage reads one or more CSV tables, applies the ID normalizer and
//! table utilities, and produces a new table. Stages are independent: state
//! moves between them only through CSV files on disk.
//!
//! 1. [`select_best`]: best row per group from a raw tool run
//! 2. [`folder`]: filter or combine every CSV in a folder
//! 3. [`normalize`]: coerce a combined sheet into the master schema
//! 4. [`master`]: upsert model metrics or update ligand RMSD in a master table
//! 5. [`finalize`]: rename, exclude, and drop incomplete rows
//!
//! [`predictions`] checks and gathers raw prediction files before scoring.

pub mod finalize;
pub mod folder;
pub mod master;
pub mod normalize;
pub mod predictions;
pub mod select_best;

mod files;
