use std::env;

fn print_usage() {
    eprintln!("Usage: boxgrab [OPTIONS] [text|urls]...");
    eprintln!();
    eprintln!("Scans the given text (or stdin) for UpToBox and go4up links, checks them");
    eprintln!("and prints `filename<TAB>direct-url` for every file that could be unlocked.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --check         Only list the releases found, do not unlock links");
    eprintln!("  -r, --release NAME  Rename a matching group after a catalog release name");
    eprintln!("                      (repeatable)");
    eprintln!("  -V, --version       Print version");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  boxgrab http://uptobox.com/hrfow01yixy4 http://go4up.com/dl/7a3115e52d50");
}

#[tokio::main]
async fn main() -> boxgrab::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }
    if args.iter().any(|a| a == "-V" || a == "--version") {
        println!("boxgrab {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let options = boxgrab::cli::CliOptions::from_args(&args);
    tokio::select! {
        result = boxgrab::cli::run(options) => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Received SIGINT");
            eprintln!("Interrupted.");
            Ok(())
        }
    }
}
