use frange::{
    args::get_opts,
    run::{collect_jobs, run_all},
};

use std::{
    io::{self, Write},
    process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

fn main() {
    let opts = get_opts();

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        eprintln!("frange: could not install Ctrl-C handler: {e}");
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let result = collect_jobs(&opts)
        .and_then(|(jobs, format)| run_all(&jobs, &opts, format, &mut out, &interrupted))
        .and_then(|()| out.flush().map_err(Into::into));

    if let Err(e) = result {
        eprintln!("frange: {e}");
        process::exit(1);
    }
}
