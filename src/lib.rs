//! Event engine for the HEP-CE hepatitis C microsimulation.
//!
//! HEP-CE follows a cohort of individuals month by month. Each month every living [`Person`]
//! passes through a configured sequence of [`Event`]s: aging, substance use, HCV and HIV
//! infection, clearance, fibrosis progression and staging, screening, linkage to care,
//! treatment, overdose, pregnancy and death. Each event reads its parameters from a
//! [`ConfigSource`] and its stratified probability tables from a [`StratifiedSource`] once, when
//! it is built, and draws every random outcome through a [`Sampler`].
//!
//! Events accrue discounted costs and utilities onto the person, which are the outputs of a
//! cost-effectiveness run. The population can be written to and read from CSV with
//! [`population::write_population`] and [`population::read_population`].
//!
//! A minimal run:
//!
//! ```rust
//! use hepce::config::Config;
//! use hepce::data::InMemorySource;
//! use hepce::person::{IdAllocator, Person};
//! use hepce::sampler::RandomSampler;
//! use hepce::simulation::Simulation;
//!
//! let config = Config::new()
//!     .with("cost.discounting_rate", 0.025)
//!     .with("simulation.events", "Aging,Death");
//! let source = InMemorySource::new()
//!     .with_csv("background_impacts", "age_years,gender,drug_behavior,cost,utility\n")
//!     .with_csv("background_mortality", "age_years,gender,background_mortality\n25,0,0.001\n")
//!     .with_csv("smr", "gender,drug_behavior,smr\n0,0,1.0\n");
//! let mut ids = IdAllocator::new();
//! let population = (0..10).map(|_| Person::new(ids.next_id())).collect();
//! let mut simulation = Simulation::from_config(&config, &source, population).unwrap();
//! simulation.run(&mut RandomSampler::new(7), 12).unwrap();
//! assert!(simulation.population().iter().all(|p| p.life_span() <= 12));
//! ```
//!
//! [`Person`]: person::Person
//! [`Event`]: event::Event
//! [`ConfigSource`]: config::ConfigSource
//! [`StratifiedSource`]: data::StratifiedSource
//! [`Sampler`]: sampler::Sampler
pub mod config;
pub mod data;
pub mod error;
pub mod event;
pub mod log;
pub mod numeric;
pub mod person;
pub mod population;
pub mod sampler;
pub mod simulation;
pub mod types;

mod macros;

pub use error::HepceError;

// Deterministic hashing for every keyed table.
pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
