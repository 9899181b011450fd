use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;

use crate::args::{Format, Options};
use crate::config::parse_config;
use crate::float_range::{FloatRange, try_frange};
use crate::index::Indexed;

type RunResult<T> = Result<T, Box<dyn std::error::Error>>;

pub struct Job {
    pub name: Option<String>,
    pub range: FloatRange,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Serialize)]
struct JsonValues<'a> {
    name: Option<&'a str>,
    range: FloatRange,
    values: Vec<f64>,
}

#[derive(Serialize)]
struct JsonQuery<'a, T> {
    name: Option<&'a str>,
    key: &'a str,
    value: T,
}

#[derive(Serialize)]
struct JsonStats<'a> {
    name: Option<&'a str>,
    #[serde(flatten)]
    stats: &'a Stats,
}

/// Builds the ranges to process from either the positional bounds or the
/// config file, along with the output format.
pub fn collect_jobs(opts: &Options) -> RunResult<(Vec<Job>, Format)> {
    if let Some(path) = &opts.config {
        if !opts.bounds.is_empty() {
            return Err("positional bounds cannot be combined with --config".into());
        }
        let cfg = parse_config(path)?;
        let jobs = cfg
            .ranges
            .iter()
            .map(|rc| -> RunResult<Job> {
                Ok(Job {
                    name: Some(rc.name.clone()),
                    range: rc.to_range()?,
                })
            })
            .collect::<RunResult<Vec<_>>>()?;
        let format = opts.format.or(cfg.format).unwrap_or_default();
        return Ok((jobs, format));
    }

    let range = match opts.bounds[..] {
        [stop] => try_frange(stop, None, None)?,
        [start, stop] => try_frange(start, Some(stop), None)?,
        [start, stop, step] => try_frange(start, Some(stop), Some(step))?,
        _ => return Err("expected STOP, START STOP or START STOP STEP".into()),
    };
    Ok((vec![Job { name: None, range }], opts.format.unwrap_or_default()))
}

pub fn run_all(
    jobs: &[Job],
    opts: &Options,
    format: Format,
    out: &mut impl Write,
    interrupted: &AtomicBool,
) -> RunResult<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.threads)
        .build()?;

    if opts.verbose {
        eprintln!(
            "processing {} range(s) on {} thread(s)",
            jobs.len(),
            pool.current_num_threads()
        );
    }

    let named = jobs.iter().any(|job| job.name.is_some());
    let mut emitter = Emitter::new(out, format, named)?;

    for job in jobs {
        if interrupted.load(Ordering::Relaxed) {
            break;
        }
        let name = job.name.as_deref();
        let range = job.range;

        if opts.verbose {
            eprintln!("{}{}", label(name), range);
        }

        if opts.repr {
            emitter.scalar(name, "repr", range.to_string())?;
        }
        if opts.len {
            emitter.scalar(name, "len", range.len())?;
        }
        if let Some(item) = opts.contains {
            emitter.scalar(name, "contains", range.contains(item))?;
        }
        if opts.stats {
            let stats = pool.install(|| stats(&range));
            emitter.stats(name, &stats)?;
        }
        if let Some(index) = opts.index {
            match range.index(index)? {
                Indexed::Value(v) => emitter.scalar(name, &index.to_string(), v)?,
                Indexed::Range(sub) => emitter.values(name, &sub, interrupted, opts.verbose)?,
            }
        }
        if opts.lists_values() {
            emitter.values(name, &range, interrupted, opts.verbose)?;
        }
    }

    emitter.finish()
}

/// Count, sum, min and max. Min and max are reduced in parallel; the sum is
/// accumulated in element order.
pub fn stats(range: &FloatRange) -> Stats {
    let (min, max) = range
        .par_iter()
        .map(|v| (v, v))
        .reduce(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |a, b| (a.0.min(b.0), a.1.max(b.1)),
        );
    let sum = range.iter().sum();
    let count = range.len();

    Stats {
        count,
        sum,
        min: (count > 0).then_some(min),
        max: (count > 0).then_some(max),
    }
}

fn label(name: Option<&str>) -> String {
    name.map(|n| format!("{n}\t")).unwrap_or_default()
}

fn opt_to_string(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes query results in one format for the whole run. CSV output is a
/// single table of `[name,]key,value` rows under one header.
enum Emitter<'w, W: Write> {
    Plain(&'w mut W),
    Csv {
        wtr: csv::Writer<&'w mut W>,
        named: bool,
    },
    Json(&'w mut W),
}

impl<'w, W: Write> Emitter<'w, W> {
    fn new(out: &'w mut W, format: Format, named: bool) -> RunResult<Self> {
        Ok(match format {
            Format::Plain => Emitter::Plain(out),
            Format::Json => Emitter::Json(out),
            Format::Csv => {
                let mut wtr = csv::Writer::from_writer(out);
                if named {
                    wtr.write_record(["name", "key", "value"])?;
                } else {
                    wtr.write_record(["key", "value"])?;
                }
                Emitter::Csv { wtr, named }
            }
        })
    }

    fn csv_row(
        wtr: &mut csv::Writer<&'w mut W>,
        named: bool,
        name: Option<&str>,
        key: &str,
        value: &str,
    ) -> RunResult<()> {
        if named {
            wtr.write_record([name.unwrap_or_default(), key, value])?;
        } else {
            wtr.write_record([key, value])?;
        }
        Ok(())
    }

    fn scalar<T>(&mut self, name: Option<&str>, key: &str, value: T) -> RunResult<()>
    where
        T: fmt::Display + Serialize,
    {
        match self {
            Emitter::Plain(out) => writeln!(out, "{}{}", label(name), value)?,
            Emitter::Csv { wtr, named } => {
                Self::csv_row(wtr, *named, name, key, &value.to_string())?
            }
            Emitter::Json(out) => {
                serde_json::to_writer(&mut **out, &JsonQuery { name, key, value })?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    fn stats(&mut self, name: Option<&str>, stats: &Stats) -> RunResult<()> {
        match self {
            Emitter::Plain(out) => writeln!(
                out,
                "{}count {} sum {} min {} max {}",
                label(name),
                stats.count,
                stats.sum,
                opt_to_string(stats.min),
                opt_to_string(stats.max)
            )?,
            Emitter::Csv { wtr, named } => {
                let rows = [
                    ("count", stats.count.to_string()),
                    ("sum", stats.sum.to_string()),
                    ("min", opt_to_string(stats.min)),
                    ("max", opt_to_string(stats.max)),
                ];
                for (key, value) in rows {
                    Self::csv_row(wtr, *named, name, key, &value)?;
                }
            }
            Emitter::Json(out) => {
                serde_json::to_writer(&mut **out, &JsonStats { name, stats })?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    /// Streams the elements of `range`, stopping early once `interrupted` is set.
    fn values(
        &mut self,
        name: Option<&str>,
        range: &FloatRange,
        interrupted: &AtomicBool,
        verbose: bool,
    ) -> RunResult<()> {
        let mut written = 0usize;
        let values = range
            .iter()
            .take_while(|_| !interrupted.load(Ordering::Relaxed))
            .inspect(|_| written += 1);

        match self {
            Emitter::Plain(out) => {
                for v in values {
                    writeln!(out, "{}{}", label(name), v)?;
                }
            }
            Emitter::Csv { wtr, named } => {
                for (i, v) in values.enumerate() {
                    Self::csv_row(wtr, *named, name, &i.to_string(), &v.to_string())?;
                }
            }
            Emitter::Json(out) => {
                let doc = JsonValues {
                    name,
                    range: *range,
                    values: values.collect(),
                };
                serde_json::to_writer(&mut **out, &doc)?;
                writeln!(out)?;
            }
        }

        if verbose && interrupted.load(Ordering::Relaxed) {
            eprintln!("interrupted after {} of {} values", written, range.len());
        }

        Ok(())
    }

    fn finish(self) -> RunResult<()> {
        if let Emitter::Csv { mut wtr, .. } = self {
            wtr.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(argv: &[&str]) -> RunResult<String> {
        let opts = Options::try_parse_from(argv)?;
        let (jobs, format) = collect_jobs(&opts)?;
        let mut out = Vec::new();
        run_all(&jobs, &opts, format, &mut out, &AtomicBool::new(false))?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_plain_values() {
        assert_eq!(run(&["frange", "5"]).unwrap(), "0\n1\n2\n3\n4\n");
        assert_eq!(run(&["frange", "0", "1", "0.25"]).unwrap(), "0\n0.25\n0.5\n0.75\n");
        assert_eq!(run(&["frange", "3", "0", "-1"]).unwrap(), "3\n2\n1\n");
    }

    #[test]
    fn test_queries() {
        let out = run(&["frange", "0", "5", "2", "--repr", "--len", "--contains", "4"]).unwrap();
        assert_eq!(out, "frange(0, 5, 2)\n3\ntrue\n");
    }

    #[test]
    fn test_index_and_slice() {
        assert_eq!(run(&["frange", "10", "-i", "-1"]).unwrap(), "9\n");
        assert_eq!(run(&["frange", "10", "-i", "2:5"]).unwrap(), "2\n3\n4\n");
        let err = run(&["frange", "10", "-i", "10"]).unwrap_err();
        assert!(err.to_string().contains("index out of range"));
    }

    #[test]
    fn test_csv() {
        let out = run(&["frange", "3", "-f", "csv"]).unwrap();
        assert_eq!(out, "key,value\n0,0\n1,1\n2,2\n");
    }

    #[test]
    fn test_json() {
        let out = run(&["frange", "1", "3", "--format", "json"]).unwrap();
        assert_eq!(
            out,
            "{\"name\":null,\"range\":{\"start\":1.0,\"stop\":3.0,\"step\":1.0},\"values\":[1.0,2.0]}\n"
        );
    }

    #[test]
    fn test_stats() {
        let out = run(&["frange", "5", "--stats", "-t", "2"]).unwrap();
        assert_eq!(out, "count 5 sum 10 min 0 max 4\n");

        let empty = stats(&FloatRange::new(0.0, 5.0, 1.0));
        assert_eq!(
            empty,
            Stats { count: 0, sum: 0.0, min: None, max: None }
        );
    }

    #[test]
    fn test_bad_input() {
        assert!(run(&["frange"]).is_err());
        assert!(run(&["frange", "0", "1", "0"]).is_err());
        assert!(run(&["frange", "1", "-c", "ranges.json"]).is_err());
    }

    #[test]
    fn test_interrupted_stops_output() {
        let opts = Options::try_parse_from(["frange", "1000000"]).unwrap();
        let (jobs, format) = collect_jobs(&opts).unwrap();
        let mut out = Vec::new();
        run_all(&jobs, &opts, format, &mut out, &AtomicBool::new(true)).unwrap();
        assert!(out.is_empty());
    }

    fn run_with_config(file: &str, json: &str, args: &[&str]) -> RunResult<String> {
        let path = std::env::temp_dir().join(format!("frange-{}-{file}.json", std::process::id()));
        std::fs::write(&path, json)?;
        let path_arg = path.to_string_lossy().into_owned();
        let mut argv = vec!["frange", "-c", path_arg.as_str()];
        argv.extend_from_slice(args);
        let out = run(&argv);
        std::fs::remove_file(&path)?;
        out
    }

    const TWO_RANGES: &str = r#"{"ranges": [{"name": "a", "stop": 2}, {"name": "b", "start": 1, "stop": 2, "step": 0.5}], "format": "csv"}"#;

    #[test]
    fn test_config_jobs() {
        let out = run_with_config("jobs", TWO_RANGES, &[]).unwrap();
        assert_eq!(out, "name,key,value\na,0,0\na,1,1\nb,0,1\nb,1,1.5\n");
    }

    #[test]
    fn test_scalar_queries_follow_format() {
        assert_eq!(
            run(&["frange", "5", "--len", "-f", "json"]).unwrap(),
            "{\"name\":null,\"key\":\"len\",\"value\":5}\n"
        );
        assert_eq!(
            run(&["frange", "5", "-i", "1", "-f", "csv"]).unwrap(),
            "key,value\n1,1\n"
        );
        assert_eq!(
            run(&["frange", "0", "5", "2", "--repr", "--contains", "4", "-f", "csv"]).unwrap(),
            "key,value\nrepr,\"frange(0, 5, 2)\"\ncontains,true\n"
        );
    }

    #[test]
    fn test_json_stats_carry_names() {
        let out = run_with_config("stats", TWO_RANGES, &["--stats", "-f", "json"]).unwrap();
        assert_eq!(
            out,
            "{\"name\":\"a\",\"count\":2,\"sum\":1.0,\"min\":0.0,\"max\":1.0}\n\
             {\"name\":\"b\",\"count\":2,\"sum\":2.5,\"min\":1.0,\"max\":1.5}\n"
        );
    }

    #[test]
    fn test_csv_stats_share_header() {
        let out = run(&["frange", "3", "--stats", "--len", "-f", "csv"]).unwrap();
        assert_eq!(out, "key,value\nlen,3\ncount,3\nsum,3\nmin,0\nmax,2\n");
    }

    #[test]
    fn test_stats_sum_independent_of_threads() {
        let r = FloatRange::new(10.0, 0.0, 0.1);
        let expected: f64 = r.iter().sum();
        for threads in [1, 2, 3, 8] {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            assert_eq!(pool.install(|| stats(&r)).sum, expected);
        }
    }
}
