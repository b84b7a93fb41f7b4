// To run this example:
//
//   $ RUST_LOG=csv_textfield=debug cargo run --example sample
use std::error::Error;
use std::io;
use std::process;

use csv_textfield::{Reader, ReaderBuilder, Writer};
use tracing_subscriber::EnvFilter;

const PEOPLE: &str = "\
Name,Birth Date
\"Creed, Apollo\",1942-08-17
\"Ivan
Drago\",1961-11-03
\"Robert \"\"Rocky\"\" Balboa\",1945-07-06
";

const PEOPLE_BROKEN: &str = "\
Name,Birth Date
\"Creed, Apollo\",1942-08-17
\"Iv\"an
Drago\",1961-11-03
\"Robert \"\"Rocky\"\" Balboa\",1945-07-06
";

fn print_people(data: &str) -> Result<(), Box<dyn Error>> {
    let mut rdr = Reader::from_reader(data.as_bytes());
    // Skip the header line.
    if rdr.has_more_data()? {
        rdr.read_record()?;
    }
    while rdr.has_more_data()? {
        match rdr.read_record() {
            Ok(Some(record)) => {
                println!("{} was born on {}", record[0], record[1]);
            }
            Ok(None) => break,
            Err(ref err) if err.is_malformed_line() => {
                eprintln!(
                    "Failed to parse line {}: {}",
                    rdr.error_line_number(),
                    rdr.error_line()
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn rewrite_pipe_delimited(data: &str) -> Result<(), Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new()
        .compatibility_mode(true)
        .from_reader(data.as_bytes())?;
    let mut wtr = Writer::from_writer(io::stdout());
    wtr.set_delimiter("|")?;
    wtr.set_quote('\'')?;
    for result in rdr.records() {
        wtr.write_record(&result?)?;
    }
    wtr.close()?;
    Ok(())
}

fn example() -> Result<(), Box<dyn Error>> {
    println!("This parser:");
    print_people(PEOPLE)?;
    println!();

    println!("This parser with an error:");
    print_people(PEOPLE_BROKEN)?;
    println!();

    println!("Rewritten with '|' and ''':");
    rewrite_pipe_delimited(PEOPLE)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = example() {
        println!("error running example: {}", err);
        process::exit(1);
    }
}
