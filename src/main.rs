// Copyright 2025 cjtag-bridge contributors
// Licensed under the Apache-2.0 and MIT licenses.

use clap::{crate_description, crate_version, value_parser, Arg, ArgAction, Command};

use cjtag_bridge::vpi::VpiServer;

fn main() -> anyhow::Result<()> {
    let matches = Command::new("cjtag-bridge")
        .version(crate_version!())
        .about(crate_description!())
        .arg(Arg::new("quiet")
             .help("Suppress informative output and raise log level to errors only")
             .long("quiet")
             .short('q')
             .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
             .help("Increase log level, specify once for info, twice for debug, three times for trace")
             .long("verbose")
             .short('v')
             .action(ArgAction::Count)
             .conflicts_with("quiet"))
        .arg(Arg::new("port")
             .help("TCP port for the host (OpenOCD jtag_vpi) listener")
             .long("port")
             .short('p')
             .action(ArgAction::Set)
             .default_value("3333")
             .value_parser(value_parser!(u16)))
        .arg(Arg::new("settle-ticks")
             .help("Synchronized ticks run after each applied signal change (minimum 4)")
             .long("settle-ticks")
             .action(ArgAction::Set)
             .default_value("8")
             .value_parser(value_parser!(u32)))
        .get_matches();

    let quiet = matches.get_flag("quiet");
    let verbose = matches.get_count("verbose");
    let env = if quiet {
        env_logger::Env::default().default_filter_or("error")
    } else if verbose == 0 {
        env_logger::Env::default().default_filter_or("warn")
    } else if verbose == 1 {
        env_logger::Env::default().default_filter_or("info")
    } else if verbose == 2 {
        env_logger::Env::default().default_filter_or("debug")
    } else {
        env_logger::Env::default().default_filter_or("trace")
    };
    env_logger::Builder::from_env(env).format_timestamp(None).init();

    let port = *matches.get_one::<u16>("port").unwrap();
    // The synchronizer needs at least four ticks to surface an edge.
    let settle_ticks = (*matches.get_one::<u32>("settle-ticks").unwrap()).max(4);

    let mut server = VpiServer::bind(port, settle_ticks)?;
    if !quiet {
        println!("cJTAG bridge listening on port {}.", server.local_addr()?.port());
    }

    server.run()?;

    if !quiet {
        println!("Simulation stopped by host.");
    }
    Ok(())
}
