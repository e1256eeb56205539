use clap::{Args, Parser, Subcommand};
use log::debug;
use real48::{combine, split, DecodeOptions, IntegerPair, Method, Real48, ReservedExponent};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "r48", about = "Decode Borland Pascal real48 values")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a value given as 12 hex digits (S-F-E order)
    Decode {
        hex: String,
        #[command(flatten)]
        opts: DecodeArgs,
    },
    /// Reassemble a value from its 2-byte and 4-byte integer columns, then decode it
    Combine {
        #[arg(allow_negative_numbers = true)]
        int2: i64,
        #[arg(allow_negative_numbers = true)]
        int4: i64,
        #[command(flatten)]
        opts: DecodeArgs,
    },
    /// Print the integer pair a value is stored as
    Split {
        hex: String,
    },
}

#[derive(Args)]
struct DecodeArgs {
    /// Conversion: single, double, arith or all (default: all)
    #[arg(short, long)]
    method: Option<String>,
    /// Reverse the byte order first (value stored E-F-S)
    #[arg(short, long)]
    reverse: bool,
    /// Fail on the reserved exponent 255 instead of decoding it
    #[arg(short, long)]
    strict: bool,
    /// Print a JSON report
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    hex:      String,
    sign:     u8,
    exponent: u8,
    reserved: bool,
    methods:  Vec<Method>,
    /// Integer columns of the value as given, before any reversal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pair:     Option<IntegerPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    single:   Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    double:   Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arith:    Option<f64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    match Cli::parse().command {

        // ── Decode ───────────────────────────────────────────────────────────
        Commands::Decode { hex, opts } => {
            let r48: Real48 = hex.parse()?;
            print_report(&build_report(&r48, &opts)?, opts.json)?;
        }

        // ── Combine ──────────────────────────────────────────────────────────
        Commands::Combine { int2, int4, opts } => {
            let r48 = combine(int2, int4)?;
            debug!("combined ({}, {}) -> {}", int2, int4, r48);
            print_report(&build_report(&r48, &opts)?, opts.json)?;
        }

        // ── Split ────────────────────────────────────────────────────────────
        Commands::Split { hex } => {
            let r48: Real48 = hex.parse()?;
            let pair = split(&r48)?;
            println!("int2 {}", pair.int2());
            println!("int4 {}", pair.int4());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn build_report(r48: &Real48, args: &DecodeArgs) -> Result<Report, Box<dyn std::error::Error>> {
    let methods = parse_methods(args.method.as_deref())?;
    let view = if args.reverse { r48.reversed() } else { *r48 };

    let mut out = Report {
        hex:      view.to_string(),
        sign:     view.sign(),
        exponent: view.exponent(),
        reserved: view.has_reserved_exponent(),
        methods:  methods.clone(),
        pair:     split(r48).ok(),
        single:   None,
        double:   None,
        arith:    None,
    };
    for method in methods {
        let opts = DecodeOptions {
            method,
            reserved_exponent: if args.strict { ReservedExponent::Reject } else { ReservedExponent::Passthrough },
            reverse: args.reverse,
        };
        let value = r48.decode(&opts)?;
        match method {
            Method::Single     => out.single = Some(value),
            Method::Double     => out.double = Some(value),
            Method::Arithmetic => out.arith  = Some(value),
        }
    }
    Ok(out)
}

fn print_report(out: &Report, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(out)?);
        return Ok(());
    }

    println!("  Bytes     {}", out.hex);
    println!("  Sign      {}", out.sign);
    println!("  Exponent  {}{}", out.exponent, if out.reserved { " (reserved)" } else { "" });
    for (label, value) in [("Single", out.single), ("Double", out.double), ("Arith", out.arith)] {
        if let Some(v) = value {
            println!("  {:<9} {}", label, v);
        }
    }
    Ok(())
}

/// `None` and `"all"` select every method.
fn parse_methods(name: Option<&str>) -> Result<Vec<Method>, Box<dyn std::error::Error>> {
    match name {
        None => Ok(Method::ALL.to_vec()),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(Method::ALL.to_vec()),
        Some(s) => Method::from_name(s)
            .map(|m| vec![m])
            .ok_or_else(|| format!("Unknown method '{}', expected single, double, arith or all", s).into()),
    }
}
