//! Contention harness for the `cas-spinlock` crate.
//!
//! Spawns worker threads that increment a shared counter, waits for all of
//! them, and prints the final value. Run with `--unprotected` to watch
//! updates get lost.

use cas_spinlock::config::{Command, HarnessConfig, ENV_INCREMENTS, ENV_PROTECT, ENV_WORKERS};
use cas_spinlock::harness;
use log::*;

fn setup_logger() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "cas_spinlock=info");
    }
    env_logger::init();
}

fn print_help() {
    println!("cas-spinlock v{}", env!("CARGO_PKG_VERSION"));
    println!("Increments a shared counter from many threads, with or without a spinlock.\n");
    println!("USAGE:");
    println!("    cas-spinlock [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    -n, --increments N    Total increment requests (default 1000)");
    println!("    -w, --workers N       Worker threads (default: available parallelism)");
    println!("        --protected       Guard each increment with the spinlock (default)");
    println!("        --unprotected     Increment without any locking");
    println!("    -h, --help            Show this help message\n");
    println!("ENVIRONMENT:");
    println!("    {ENV_INCREMENTS:<18}Same as --increments");
    println!("    {ENV_WORKERS:<18}Same as --workers");
    println!("    {ENV_PROTECT:<18}true/false, same as --protected/--unprotected");
    println!("    RUST_LOG          Log filter (default cas_spinlock=info)\n");
    println!("EXAMPLES:");
    println!("    cas-spinlock                              # 1000 protected increments");
    println!("    cas-spinlock -n 100000 -w 16 --unprotected");
}

fn main() {
    let cfg = HarnessConfig::from_env().unwrap_or_else(|e| {
        eprintln!("invalid environment: {e}");
        std::process::exit(1);
    });

    let cfg = match cfg.apply_args(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            print_help();
            return;
        }
        Ok(Command::Run(cfg)) => cfg,
        Err(e) => {
            eprintln!("{e}\n\nrun with --help for usage");
            std::process::exit(1);
        }
    };

    setup_logger();
    debug!("config: {cfg:?}");

    let report = harness::run(&cfg).unwrap_or_else(|e| {
        error!("harness failed: {e}");
        std::process::exit(1);
    });

    println!("{}", report.observed);
}
