//! Seed module - default starter records and the seeding step.

mod seeder;

pub use seeder::{default_seed, seed_if_empty, SeedTarget, SEED_VERSION};
