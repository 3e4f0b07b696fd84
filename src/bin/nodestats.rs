#![allow(unknown_lints)]

extern crate chrono;
extern crate fern;
#[macro_use]
extern crate log;
extern crate nodestats;
extern crate serde_json;

use chrono::Utc;
use nodestats::source::{Link, Replay, Source};
use nodestats::store::{self, MetricsStore, Snapshot};
use nodestats::view::{self, MiscView};
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use std::sync::mpsc;
use std::thread;

fn main() {
    let args = match nodestats::config::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("nodestats: {}", e);
            process::exit(1);
        }
    };

    let level = match args.verbose {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}][{}] {}",
                record.module_path().unwrap_or("?"),
                record.line().unwrap_or(0),
                Utc::now().to_rfc3339(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply();
    if let Err(e) = logger {
        eprintln!("nodestats: could not set up logging: {}", e);
        process::exit(1);
    }

    info!("nodestats - {}", args.version);

    let link = Link::default();
    let store = match MetricsStore::new(args.capacity) {
        Ok(store) => store::shared(store.transport(link.clone())),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if args.console {
        store::lock(&store).subscribe(|snapshot: &Snapshot| {
            println!("{}", view::render(snapshot));
        });
    }

    let mut misc = MiscView::new(store.clone(), args.tick_interval);
    if let Err(e) = misc.start() {
        error!("could not start view ticker: {}", e);
        process::exit(1);
    }

    let (snd, rcv) = mpsc::channel();
    let source_path = args.source_path.clone();
    let pace = args.pace;
    let replay = thread::Builder::new()
        .name("replay".to_string())
        .spawn(move || match source_path {
            Some(path) => match File::open(&path) {
                Ok(fp) => Replay::new(BufReader::new(fp), link, snd).pace(pace).run(),
                Err(e) => error!("could not open {}: {}", path.display(), e),
            },
            None => {
                let stdin = io::stdin();
                let mut replay = Replay::new(stdin.lock(), link, snd).pace(pace);
                replay.run();
            }
        });
    let replay = match replay {
        Ok(handle) => handle,
        Err(e) => {
            error!("could not start replay: {}", e);
            process::exit(1);
        }
    };

    let applied = store::drain(&store, rcv);
    if replay.join().is_err() {
        error!("replay thread panicked");
    }
    misc.stop();

    let mut store = store::lock(&store);
    match serde_json::to_string(&store.snapshot().charts) {
        Ok(charts) => debug!("final charts: {}", charts),
        Err(e) => warn!("could not serialize charts: {}", e),
    }
    info!("applied {} samples, dropped {}", applied, store.dropped());
    store.shutdown();
}
