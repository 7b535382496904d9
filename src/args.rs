//! Command-line parsing.

use std::path::PathBuf;

pub fn print_usage() {
    eprintln!("Usage: cellflow [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                      Sheet to open (.json or .csv)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <CELL=TEXT>       Set a cell (literal or =formula)");
    eprintln!("      --fill <CELL> <RANGE>   Copy CELL into RANGE, shifting references");
    eprintln!("  -e, --eval <FORMULA>        Submit a formula as from the formula bar");
    eprintln!("      --clear                 Empty every cell");
    eprintln!("  -o, --output <FILE>         Save the sheet (.json or .csv)");
    eprintln!("  -p, --print                 Print the grid");
    eprintln!("      --chart                 Draw a line chart of every column");
    eprintln!("      --rows <N>              Grid rows (default 10)");
    eprintln!("      --cols <N>              Grid columns (default 10)");
    eprintln!("  -c, --config <FILE>         Read settings from FILE");
    eprintln!("      --no-config             Ignore the user config file");
    eprintln!("      --functions             List built-in functions");
    eprintln!("  -v, --verbose               Debug logging on stderr");
    eprintln!("  -h, --help                  Print help");
    eprintln!();
    eprintln!("Actions (-s, --fill, -e, --clear) run in the order given.");
}

/// One step applied to the session, in command-line order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Set { label: String, content: String },
    Fill { anchor: String, range: String },
    Eval(String),
    Clear,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cli {
    pub file: Option<PathBuf>,
    pub actions: Vec<Action>,
    pub output: Option<PathBuf>,
    pub print: bool,
    pub chart: bool,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub config: Option<PathBuf>,
    pub no_config: bool,
    pub list_functions: bool,
    pub verbose: bool,
    pub help: bool,
}

pub fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut cli = Cli::default();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = |what: &str| -> Result<String, String> {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| format!("{} requires {}", arg, what))
        };

        match arg {
            "-h" | "--help" => cli.help = true,
            "-v" | "--verbose" => cli.verbose = true,
            "-p" | "--print" => cli.print = true,
            "--chart" => cli.chart = true,
            "--functions" => cli.list_functions = true,
            "--no-config" => cli.no_config = true,
            "--clear" => cli.actions.push(Action::Clear),
            "-c" | "--config" => cli.config = Some(PathBuf::from(value("a file path")?)),
            "-o" | "--output" => cli.output = Some(PathBuf::from(value("a file path")?)),
            "--rows" => cli.rows = Some(parse_dimension(arg, &value("a number")?)?),
            "--cols" => cli.cols = Some(parse_dimension(arg, &value("a number")?)?),
            "-e" | "--eval" => cli.actions.push(Action::Eval(value("a formula")?)),
            "-s" | "--set" => {
                let assignment = value("CELL=TEXT")?;
                let Some((label, content)) = assignment.split_once('=') else {
                    return Err(format!("{} expects CELL=TEXT, got '{}'", arg, assignment));
                };
                cli.actions.push(Action::Set {
                    label: label.trim().to_string(),
                    content: content.to_string(),
                });
            }
            "--fill" => {
                let anchor = value("a cell and a range")?;
                let range = value("a cell and a range")?;
                cli.actions.push(Action::Fill { anchor, range });
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("Unknown option: {}", other));
            }
            _ => {
                if cli.file.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                cli.file = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    Ok(cli)
}

fn parse_dimension(flag: &str, text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{} expects a positive number, got '{}'", flag, text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, String> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_args(&args)
    }

    #[test]
    fn test_actions_keep_order() {
        let cli = parse(&["-s", "A1=3", "--fill", "B1", "B1:B3", "-e", "=SUM(A1:A2)"]).unwrap();
        assert_eq!(
            cli.actions,
            vec![
                Action::Set {
                    label: "A1".into(),
                    content: "3".into()
                },
                Action::Fill {
                    anchor: "B1".into(),
                    range: "B1:B3".into()
                },
                Action::Eval("=SUM(A1:A2)".into()),
            ]
        );
    }

    #[test]
    fn test_set_splits_on_first_equals() {
        let cli = parse(&["--set", "B1==A1+1"]).unwrap();
        assert_eq!(
            cli.actions,
            vec![Action::Set {
                label: "B1".into(),
                content: "=A1+1".into()
            }]
        );
    }

    #[test]
    fn test_file_and_flags() {
        let cli = parse(&["sheet.csv", "-p", "--rows", "4", "--no-config"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("sheet.csv")));
        assert!(cli.print);
        assert!(cli.no_config);
        assert_eq!(cli.rows, Some(4));
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["-o"]).is_err());
        assert!(parse(&["--rows", "0"]).is_err());
        assert!(parse(&["-s", "A1"]).is_err());
        assert!(parse(&["a.json", "b.json"]).is_err());
    }
}
