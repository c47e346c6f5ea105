//! Main function for the Cofre pool server
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

mod server;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use log::info;
use policy_utils::policy::Policy;
use std::{fs, path, process};

#[derive(Parser, Debug)]
#[command(rename_all = "kebab")]
struct Args {
    /// Path to the pool policy file
    #[arg()]
    policy_path: path::PathBuf,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug)]
enum Role {
    /// Serve key-synchronization sessions to candidate pool members
    Leader {
        /// Path to the secret state to export
        #[arg(long)]
        state: path::PathBuf,
    },
    /// Join a pool by requesting the secret state from a leader
    Follower {
        /// Path where the installed secret state is written
        #[arg(long)]
        state: path::PathBuf,
    },
}

/// Entry point
fn main() {
    // parse args
    let args = Args::parse();

    // setup logger
    env_logger::init();

    // load policy
    info!("loading policy {:?}", args.policy_path);
    let policy_result = fs::read_to_string(&args.policy_path)
        .map_err(|err| anyhow!(err))
        .and_then(|policy_json| Ok(Policy::from_json(&policy_json)?));
    let policy = match policy_result {
        Ok(policy) => policy,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    let result = match args.role {
        Role::Leader { state } => server::run_leader(&policy, &state),
        Role::Follower { state } => server::run_follower(&policy, &state),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}
