//! Lumo headless runner.
//!
//! Loads a bundled JavaScript application, drives the host loop for a
//! fixed number of ticks, and writes the last published canvas frame to
//! a PNG.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use image::RgbaImage;
use owo_colors::OwoColorize;

use lumo_host::{Frame, Host, HostConfig};

/// Run a bundled canvas application without a display.
#[derive(Parser)]
#[command(name = "lumo", version, about)]
struct Args {
    /// Bundle directory holding the application's scripts and resources.
    bundle: PathBuf,

    /// Entry script, as a bundle-relative URL.
    #[arg(long, default_value = "./startApp.js")]
    entry: String,

    /// Number of host ticks to run (~60 per second).
    #[arg(long, default_value_t = 120)]
    ticks: u32,

    /// Where to write the final frame.
    #[arg(long, default_value = "frame.png")]
    output: PathBuf,

    /// Display width reported to the script.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Display height reported to the script.
    #[arg(long, default_value_t = 1080)]
    height: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let published: Rc<RefCell<(u64, Option<RgbaImage>)>> = Rc::new(RefCell::new((0, None)));
    let sink_slot = Rc::clone(&published);

    let config = HostConfig {
        display_width: args.width,
        display_height: args.height,
        bundle_dir: args.bundle,
        ..HostConfig::default()
    };
    let mut host = Host::new(config, move |frame: Frame| {
        let mut slot = sink_slot.borrow_mut();
        slot.0 += 1;
        slot.1 = Some(frame.image);
    });

    host.load_entry_script(&args.entry)?;
    host.run_for(args.ticks);

    let (count, last) = {
        let mut slot = published.borrow_mut();
        (slot.0, slot.1.take())
    };
    match last {
        Some(image) => {
            image.save(&args.output)?;
            println!(
                "{} {} frame(s) published; wrote {}x{} to {}",
                "done:".green(),
                count,
                image.width(),
                image.height(),
                args.output.display()
            );
        }
        None => println!("{} no frames were published", "done:".yellow()),
    }
    Ok(())
}
