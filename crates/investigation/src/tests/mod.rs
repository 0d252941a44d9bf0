//! End-to-end pipeline scenarios with scripted collaborators.

mod pipeline_scenarios;
