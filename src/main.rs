//! alice-router
//!
//! Sits in front of the application fleet and routes every HTTP request
//! through rules kept in a shared Redis.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────────┐
//!                         │                     ALICE ROUTER                       │
//!                         │                                                        │
//!     Client Request      │  ┌─────────┐   ┌──────────┐   ┌────────────────────┐  │
//!     ────────────────────┼─▶│  http   │──▶│ pipeline │──▶│ routing            │  │
//!                         │  │ server  │   │          │   │ domain → gate →    │  │
//!                         │  └─────────┘   └────┬─────┘   │ path               │  │
//!                         │                     │         └─────────┬──────────┘  │
//!                         │                     │                   ▼             │
//!                         │                     │         ┌────────────────────┐  │
//!                         │                     │         │ load_balancer      │  │
//!                         │                     │         │ backend → passer   │  │
//!                         │                     │         └─────────┬──────────┘  │
//!                         │                     ▼                   │             │        ┌────────┐
//!                         │               ┌──────────┐              └─────────────┼───────▶│ Redis  │
//!                         │               │  stats   │─────────────────────────────┼───────▶│ (rules,│
//!                         │               └──────────┘                             │        │ pools) │
//!     Client Response     │  ┌──────────┐                                          │        └────────┘
//!     ◀───────────────────┼──│ response │◀── passer on machine:port ◀──────────────┼──── Backend
//!                         │  └──────────┘                                          │
//!                         └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use alice_router::lifecycle::startup::{self, Args};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    startup::run(args).await?;
    Ok(())
}
