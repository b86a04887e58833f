//! Check command - probe a local port once.

use anyhow::Result;
use portgate_core::{Probe, TcpProbe};

pub fn run(port: u16, json: bool) -> Result<()> {
    let ready = TcpProbe::new().is_ready(port);

    if json {
        println!("{}", serde_json::json!({ "port": port, "ready": ready }));
    } else if ready {
        println!("Port {} is accepting connections.", port);
    } else {
        println!("Port {} is not accepting connections.", port);
    }

    if !ready {
        std::process::exit(1);
    }
    Ok(())
}
