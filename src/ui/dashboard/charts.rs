use std::ops::RangeInclusive;

use egui::{Align2, Color32, RichText, Stroke, Ui, Vec2b};
use egui_extras::{Column, TableBuilder};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
    uniform_grid_spacer,
};
use itertools::Itertools;

use paddock::{
    ChartData,
    aggregation::{format_delta, format_lap_time},
    panels::{
        AccelerationChart, HeadToHeadChart, QualifyingDeltaChart, RaceDistributionChart,
        SectorTimesChart,
    },
    session::Compound,
};

use crate::ui::{compound_color, team_color};

const SECTOR_PLOT_HEIGHT: f32 = 260.;
const TELEMETRY_PLOT_HEIGHT: f32 = 220.;
const VIOLIN_HALF_WIDTH: f64 = 0.4;
const SWARM_SPREAD: f64 = 0.05;

/// Axis formatter that prints category names at integer positions. `sign` is -1 for charts
/// laid out top to bottom.
fn category_formatter(
    labels: Vec<String>,
    sign: f64,
) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| -> String {
        let position = mark.value * sign;
        let index = position.round();
        if (position - index).abs() > 1e-6 || index < 0. {
            return String::new();
        }
        labels.get(index as usize).cloned().unwrap_or_default()
    }
}

pub(crate) fn show_chart(ui: &mut Ui, chart: &ChartData) {
    ui.label(RichText::new(chart.title()).color(Color32::WHITE).strong().size(18.));
    ui.add_space(8.);
    match chart {
        ChartData::QualifyingDelta(chart) => show_qualifying_delta(ui, chart),
        ChartData::SectorTimes(chart) => show_sector_times(ui, chart),
        ChartData::HeadToHead(chart) => show_head_to_head(ui, chart),
        ChartData::RaceDistribution(chart) => show_race_distribution(ui, chart),
        ChartData::Acceleration(chart) => show_acceleration(ui, chart),
    }
}

fn show_qualifying_delta(ui: &mut Ui, chart: &QualifyingDeltaChart) {
    let bars = chart
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Bar::new(-(i as f64), entry.delta.as_secs_f64())
                .name(&entry.driver)
                .fill(team_color(&entry.team))
                .stroke(Stroke::new(1., Color32::GRAY))
                .width(0.7)
        })
        .collect_vec();
    let labels = chart.entries.iter().map(|e| e.driver.clone()).collect_vec();

    Plot::new("qualifying_delta")
        .height(28. * chart.entries.len().max(5) as f32)
        .show_background(false)
        .allow_scroll(false)
        .x_axis_label("Gap to pole (s)")
        .y_axis_formatter(category_formatter(labels, -1.))
        .y_grid_spacer(uniform_grid_spacer(|_| [1., 5., 10.]))
        .include_x(0.)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new("Gap to pole", bars)
                    .horizontal()
                    .element_formatter(Box::new(|bar, _| {
                        format!("{} +{:.3}s", bar.name, bar.value)
                    })),
            );
        });

    ui.add_space(8.);
    ui.push_id("qualifying_delta_table", |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(40.))
            .column(Column::auto().at_least(60.))
            .column(Column::auto().at_least(180.))
            .column(Column::auto().at_least(80.))
            .column(Column::remainder())
            .header(20., |mut header| {
                for title in ["Pos", "Driver", "Team", "Lap time", "Gap"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (i, entry) in chart.entries.iter().enumerate() {
                    body.row(18., |mut row| {
                        row.col(|ui| {
                            ui.label(format!("{}", i + 1));
                        });
                        row.col(|ui| {
                            ui.label(RichText::new(&entry.driver).color(team_color(&entry.team)));
                        });
                        row.col(|ui| {
                            ui.label(&entry.team);
                        });
                        row.col(|ui| {
                            ui.label(format_lap_time(entry.lap_time));
                        });
                        row.col(|ui| {
                            ui.label(format!("+{}", format_delta(entry.delta)));
                        });
                    });
                }
            });
    });
}

fn show_sector_times(ui: &mut Ui, chart: &SectorTimesChart) {
    for (sector_idx, sector) in chart.sectors.iter().enumerate() {
        ui.label(
            RichText::new(format!("Sector {}", sector_idx + 1))
                .color(Color32::WHITE)
                .strong(),
        );
        if sector.is_empty() {
            ui.label(RichText::new("No sector times recorded").color(Color32::GRAY));
            continue;
        }

        let seconds = sector.iter().map(|e| e.time.as_secs_f64()).collect_vec();
        let min = seconds.iter().copied().fold(f64::INFINITY, f64::min);
        let max = seconds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let labels = sector.iter().map(|e| e.driver.clone()).collect_vec();
        let bars = sector
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                Bar::new(i as f64, entry.time.as_secs_f64())
                    .name(&entry.driver)
                    .fill(team_color(&entry.team))
                    .width(0.75)
            })
            .collect_vec();

        Plot::new(format!("sector_{}", sector_idx + 1))
            .height(SECTOR_PLOT_HEIGHT)
            .show_background(false)
            .allow_scroll(false)
            .allow_drag(false)
            .y_axis_label("Time (seconds)")
            .x_axis_formatter(category_formatter(labels, 1.))
            .x_grid_spacer(uniform_grid_spacer(|_| [1., 5., 10.]))
            .include_x(-0.5)
            .include_x(sector.len() as f64 - 0.5)
            .include_y(min - 0.2)
            .include_y(max + 0.2)
            .auto_bounds(Vec2b::new(false, false))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(format!("Sector {}", sector_idx + 1), bars));
                for (i, entry) in sector.iter().enumerate() {
                    plot_ui.text(
                        Text::new(
                            format!("{} delta", entry.driver),
                            PlotPoint::new(i as f64, entry.time.as_secs_f64() + 0.02),
                            RichText::new(format_delta(entry.delta)).color(Color32::WHITE),
                        )
                        .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            });
        ui.add_space(8.);
    }
}

fn show_head_to_head(ui: &mut Ui, chart: &HeadToHeadChart) {
    let [first, second] = &chart.traces;
    let first_color = team_color(&first.team);
    let mut second_color = team_color(&second.team);
    if first.team == second.team {
        second_color = second_color.gamma_multiply(0.5);
    }

    ui.label(
        RichText::new(format!(
            "{} {} (lap {})  |  {} {} (lap {})",
            first.driver,
            format_lap_time(first.lap_time),
            first.lap_number,
            second.driver,
            format_lap_time(second.lap_time),
            second.lap_number
        ))
        .color(Color32::LIGHT_GRAY),
    );

    let channels = [
        ("speed", "Speed (Km/h)", &first.speed, &second.speed),
        ("throttle", "Throttle (%)", &first.throttle, &second.throttle),
        ("brake", "Brake", &first.brake, &second.brake),
    ];
    let last = channels.len() - 1;
    for (idx, (id, label, first_series, second_series)) in channels.into_iter().enumerate() {
        let mut plot = Plot::new(format!("h2h_{}", id))
            .height(TELEMETRY_PLOT_HEIGHT)
            .show_background(false)
            .allow_scroll(false)
            .link_axis("h2h_distance", Vec2b::new(true, false))
            .link_cursor("h2h_distance", Vec2b::new(true, false))
            .y_axis_label(label);
        if idx == 0 {
            plot = plot.legend(Legend::default());
        }
        if idx == last {
            plot = plot.x_axis_label("Distance (m)");
        }
        plot.show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(first.driver.clone(), PlotPoints::new(first_series.clone()))
                    .color(first_color)
                    .width(1.9),
            );
            plot_ui.line(
                Line::new(second.driver.clone(), PlotPoints::new(second_series.clone()))
                    .color(second_color)
                    .width(1.9),
            );
        });
    }
}

fn show_race_distribution(ui: &mut Ui, chart: &RaceDistributionChart) {
    let labels = chart.drivers.iter().map(|d| d.driver.clone()).collect_vec();
    // one scale for every violin so they all cover the same area
    let max_density = chart
        .drivers
        .iter()
        .flat_map(|d| d.density.iter().map(|[_, density]| *density))
        .fold(0., f64::max);

    Plot::new("race_distribution")
        .height(480.)
        .show_background(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .x_axis_label("Driver")
        .y_axis_label("Lap Times (s)")
        .x_axis_formatter(category_formatter(labels, 1.))
        .x_grid_spacer(uniform_grid_spacer(|_| [1., 5., 10.]))
        .include_x(-0.5)
        .include_x(chart.drivers.len() as f64 - 0.5)
        .show(ui, |plot_ui| {
            for (i, driver) in chart.drivers.iter().enumerate() {
                if driver.density.is_empty() || max_density <= 0. {
                    continue;
                }
                let center = i as f64;
                let right = driver
                    .density
                    .iter()
                    .map(|[time, density]| [center + density / max_density * VIOLIN_HALF_WIDTH, *time]);
                let left = driver
                    .density
                    .iter()
                    .rev()
                    .map(|[time, density]| [center - density / max_density * VIOLIN_HALF_WIDTH, *time]);
                let outline = right.chain(left).collect_vec();
                let color = team_color(&driver.team);
                plot_ui.polygon(
                    Polygon::new(driver.driver.clone(), PlotPoints::new(outline))
                        .fill_color(color.gamma_multiply(0.4))
                        .stroke(Stroke::new(1., color)),
                );
            }

            for compound in Compound::ALL.map(Some).into_iter().chain([None]) {
                let points = chart
                    .drivers
                    .iter()
                    .enumerate()
                    .flat_map(|(i, driver)| {
                        driver
                            .laps
                            .iter()
                            .filter(move |lap| lap.compound == compound)
                            .map(move |lap| {
                                let jitter = (lap.lap_number % 7) as f64 - 3.;
                                [i as f64 + jitter * SWARM_SPREAD, lap.seconds]
                            })
                    })
                    .collect_vec();
                if points.is_empty() {
                    continue;
                }
                let name = compound
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                plot_ui.points(
                    Points::new(name, PlotPoints::new(points))
                        .color(compound_color(compound))
                        .filled(true)
                        .radius(3.5),
                );
            }
        });
}

fn show_acceleration(ui: &mut Ui, chart: &AccelerationChart) {
    if chart.intervals.is_empty() {
        ui.label(
            RichText::new("No driver reached 200 km/h before lifting on the opening lap")
                .color(Color32::GRAY),
        );
        return;
    }

    let labels = chart.intervals.iter().map(|i| i.driver.clone()).collect_vec();
    let launch_bars = chart
        .intervals
        .iter()
        .enumerate()
        .map(|(i, interval)| {
            Bar::new(i as f64, round_2(interval.zero_to_100().as_secs_f64()))
                .name(&interval.driver)
                .fill(team_color(&interval.team))
                .width(0.75)
        })
        .collect_vec();
    let top_speed_bars = chart
        .intervals
        .iter()
        .enumerate()
        .map(|(i, interval)| {
            Bar::new(i as f64, round_2(interval.hundred_to_200().as_secs_f64()))
                .name(&interval.driver)
                .fill(team_color(&interval.team).gamma_multiply(0.5))
                .stroke(Stroke::new(1., Color32::WHITE))
                .width(0.75)
        })
        .collect_vec();

    Plot::new("acceleration")
        .height(420.)
        .show_background(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .show_axes(Vec2b::new(true, false))
        .x_axis_formatter(category_formatter(labels, 1.))
        .x_grid_spacer(uniform_grid_spacer(|_| [1., 5., 10.]))
        .include_x(-0.5)
        .include_x(chart.intervals.len() as f64 - 0.5)
        .include_y(0.)
        .show(ui, |plot_ui| {
            let launch = BarChart::new("0-100 km/h", launch_bars);
            let top_speed = BarChart::new("100-200 km/h", top_speed_bars).stack_on(&[&launch]);
            plot_ui.bar_chart(launch);
            plot_ui.bar_chart(top_speed);

            for (i, interval) in chart.intervals.iter().enumerate() {
                let zero_to_100 = round_2(interval.zero_to_100().as_secs_f64());
                let total = round_2(zero_to_100 + round_2(interval.hundred_to_200().as_secs_f64()));
                plot_ui.text(
                    Text::new(
                        format!("{} 0-100", interval.driver),
                        PlotPoint::new(i as f64, zero_to_100 / 2.),
                        RichText::new(format!("{:.2}", zero_to_100))
                            .color(Color32::BLACK)
                            .strong(),
                    )
                    .anchor(Align2::CENTER_CENTER),
                );
                plot_ui.text(
                    Text::new(
                        format!("{} total", interval.driver),
                        PlotPoint::new(i as f64, total + 0.05),
                        RichText::new(format!("{:.2}", total)).strong(),
                    )
                    .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });

    ui.add_space(8.);
    ui.push_id("acceleration_table", |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(60.))
            .column(Column::auto().at_least(180.))
            .column(Column::auto().at_least(80.))
            .column(Column::auto().at_least(80.))
            .column(Column::remainder())
            .header(20., |mut header| {
                for title in ["Driver", "Team", "0-100", "100-200", "Total"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for interval in &chart.intervals {
                    body.row(18., |mut row| {
                        row.col(|ui| {
                            ui.label(
                                RichText::new(&interval.driver).color(team_color(&interval.team)),
                            );
                        });
                        row.col(|ui| {
                            ui.label(&interval.team);
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.2}s", interval.zero_to_100().as_secs_f64()));
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.2}s", interval.hundred_to_200().as_secs_f64()));
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.2}s", interval.total().as_secs_f64()));
                        });
                    });
                }
            });
    });
}

fn round_2(value: f64) -> f64 {
    (value * 100.).round() / 100.
}
