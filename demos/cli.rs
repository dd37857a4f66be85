use chrono::{DateTime, Utc};
use clap::Parser;
use rilltime::{parse, ResolverContext};
use tracing_subscriber::EnvFilter;

/// Resolve a time range expression, e.g. `cli -- '-7d,now:|d|'`.
#[derive(Parser, Debug)]
struct Args {
    /// The expression, in any supported notation
    expr: String,
    /// Current time (RFC 3339), defaults to the system clock
    #[arg(long)]
    now: Option<DateTime<Utc>>,
    /// Earliest timestamp in the data, defaults to `now`
    #[arg(long)]
    min: Option<DateTime<Utc>>,
    /// Latest timestamp in the data, defaults to `now`
    #[arg(long)]
    max: Option<DateTime<Utc>>,
    /// First day of the week, 1 = Monday .. 7 = Sunday
    #[arg(long, default_value_t = 1)]
    first_day: u32,
    /// First month of the fiscal year, 1 = January .. 12 = December
    #[arg(long, default_value_t = 1)]
    first_month: u32,
}

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let now = args.now.unwrap_or_else(Utc::now);
    let ctx = ResolverContext::new(now)
        .with_min_time(args.min.unwrap_or(now))
        .with_max_time(args.max.unwrap_or(now))
        .with_first_day_of_week(args.first_day)
        .with_first_month_of_year(args.first_month);

    let rt = match parse(&args.expr) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    match rt.resolve(&ctx) {
        Ok((start, end)) => {
            println!("{rt}");
            println!("start: {}", start.to_rfc3339());
            println!("end:   {}", end.to_rfc3339());
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
