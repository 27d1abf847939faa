//! Combining several files and exporting the result.

use drivetab_frame::describe::Stat;
use drivetab_frame::export::{to_csv, to_xlsx};
use drivetab_frame::plot::{PlotOptions, render_distribution};
use drivetab_frame::{Cell, concat, describe, read_xlsx};

use crate::common::quarterly_reports;

#[test]
fn test_combine_describe_export() {
    let (q1, q2) = quarterly_reports();
    let frames = vec![read_xlsx(&q1).unwrap(), read_xlsx(&q2).unwrap()];
    let combined = concat(frames);

    assert_eq!(combined.columns(), &["site", "tx_curr", "period", "tx_new"]);
    assert_eq!(combined.shape(), (4, 4));
    assert_eq!(combined.rows()[0][3], Cell::Empty);
    assert_eq!(combined.rows()[2][1], Cell::Number(130.0));

    let summary = describe(&combined);
    let tx_curr = &summary.columns[1];
    assert_eq!(tx_curr.count, 4);
    assert_eq!(tx_curr.render(Stat::Mean), "97.5");
    let site = &summary.columns[0];
    assert_eq!(site.top.as_deref(), Some("Nairobi"));
    assert_eq!(summary.columns[3].count, 2);

    let csv = String::from_utf8(to_csv(&combined).unwrap()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("site,tx_curr,period,tx_new"));
    assert_eq!(lines.next(), Some("Nairobi,120,Q1,"));

    let reread = read_xlsx(&to_xlsx(&combined).unwrap()).unwrap();
    assert_eq!(reread, combined);
}

#[test]
fn test_plot_every_numeric_column() {
    let (q1, q2) = quarterly_reports();
    let combined = concat(vec![read_xlsx(&q1).unwrap(), read_xlsx(&q2).unwrap()]);
    let numeric = combined.numeric_columns();
    assert_eq!(numeric, vec![1, 3]);
    for index in numeric {
        let name = &combined.columns()[index];
        let values = combined.numeric_values(index);
        let svg = render_distribution(name, &values, &PlotOptions::default()).unwrap();
        assert!(svg.contains(name.as_str()));
    }
}
