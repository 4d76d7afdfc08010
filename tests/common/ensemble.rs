//! In-memory CMIP6 ensembles for lineage tests

use branchline::dataset::ManifestEntry;
use branchline::{
    AttributeValue, Calendar, CalendarDateTime, CandidatePool, Cube, DatasetRecord, FacetRegistry, MemoryLoader,
    PoolManifest, TimeAxis, TimeUnits,
};

pub const SOURCE: &str = "MPI-ESM1-2-LR";
pub const MEMBER: &str = "r1i1p1f1";

/// One experiment's output: a yearly series with mid-year time points
#[derive(Debug, Clone)]
pub struct Run {
    pub experiment: String,
    pub activity: String,
    pub first_year: i32,
    pub last_year: i32,
    pub calendar: Calendar,
    pub time_units: String,
    pub units: String,
    pub short_name: String,
    /// Added to the year to form each value, to tell runs apart
    pub offset: f64,
    /// `(activity, experiment)` of the parent
    pub parent: Option<(String, String)>,
    pub branch_time_in_parent: Option<f64>,
    pub parent_time_units: Option<String>,
    pub extra: Vec<(String, AttributeValue)>,
}

impl Run {
    pub fn new(activity: &str, experiment: &str, first_year: i32, last_year: i32) -> Self {
        Self {
            experiment: experiment.to_string(),
            activity: activity.to_string(),
            first_year,
            last_year,
            calendar: Calendar::ProlepticGregorian,
            time_units: "days since 1850-01-01".to_string(),
            units: "K".to_string(),
            short_name: "tas".to_string(),
            offset: 0.0,
            parent: None,
            branch_time_in_parent: None,
            parent_time_units: None,
            extra: Vec::new(),
        }
    }

    /// Branch from a parent at a date, expressed in the parent's time units.
    pub fn branched_from(mut self, activity: &str, experiment: &str, year: i32) -> Self {
        let units: TimeUnits = "days since 1850-01-01".parse().unwrap();
        let value = units
            .date2num(&CalendarDateTime::ymd(year, 1, 1), self.calendar)
            .unwrap();
        self.parent = Some((activity.to_string(), experiment.to_string()));
        self.branch_time_in_parent = Some(value);
        self.parent_time_units = Some("days since 1850-01-01".to_string());
        self
    }

    pub fn calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn time_units(mut self, units: &str) -> Self {
        self.time_units = units.to_string();
        self
    }

    pub fn units(mut self, short_name: &str, units: &str) -> Self {
        self.short_name = short_name.to_string();
        self.units = units.to_string();
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn without_parent_time_units(mut self) -> Self {
        self.parent_time_units = None;
        self
    }

    pub fn attribute(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.extra.push((key.to_string(), value.into()));
        self
    }

    pub fn file(&self) -> String {
        format!("{}_{}.json", self.experiment, self.activity)
    }

    pub fn cube(&self) -> Cube {
        let units: TimeUnits = self.time_units.parse().unwrap();
        let years: Vec<i32> = (self.first_year..=self.last_year).collect();
        let points: Vec<f64> = years
            .iter()
            .map(|&y| {
                let mid_year = CalendarDateTime::ymd(y, 7, 1);
                units.date2num(&mid_year, self.calendar).unwrap()
            })
            .collect();
        let data: Vec<f64> = years.iter().map(|&y| y as f64 + self.offset).collect();
        let time = TimeAxis::new(points, units, self.calendar);
        let mut cube = Cube::new(self.short_name.clone(), self.units.clone(), time, vec![], data).unwrap();

        let attrs = &mut cube.attributes;
        attrs.insert("mip_era".into(), "CMIP6".into());
        attrs.insert("activity_id".into(), self.activity.as_str().into());
        attrs.insert("experiment_id".into(), self.experiment.as_str().into());
        attrs.insert("source_id".into(), SOURCE.into());
        attrs.insert("variant_label".into(), MEMBER.into());
        attrs.insert("table_id".into(), "Amon".into());
        attrs.insert("variable_id".into(), self.short_name.as_str().into());
        attrs.insert("grid_label".into(), "gn".into());
        attrs.insert("institution_id".into(), "MPI-M".into());
        attrs.insert("Conventions".into(), "CF-1.7 CMIP-6.2".into());
        attrs.insert("tracking_id".into(), format!("hdl:21.14100/{}", self.experiment).into());
        if let Some((activity, experiment)) = &self.parent {
            attrs.insert("parent_activity_id".into(), activity.as_str().into());
            attrs.insert("parent_experiment_id".into(), experiment.as_str().into());
            attrs.insert("parent_source_id".into(), SOURCE.into());
            attrs.insert("parent_variant_label".into(), MEMBER.into());
        }
        if let Some(value) = self.branch_time_in_parent {
            attrs.insert("branch_time_in_parent".into(), value.into());
        }
        if let Some(units) = &self.parent_time_units {
            attrs.insert("parent_time_units".into(), units.as_str().into());
        }
        for (key, value) in &self.extra {
            attrs.insert(key.clone(), value.clone());
        }
        cube
    }
}

/// A set of runs served from memory
#[derive(Default)]
pub struct Ensemble {
    pub loader: MemoryLoader,
    pub manifest: PoolManifest,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, run: Run) -> Self {
        self.add_cube(&run.file(), run.cube());
        self
    }

    pub fn add_cube(&mut self, file: &str, cube: Cube) {
        self.loader.insert(file, cube);
        self.manifest.datasets.push(ManifestEntry {
            file: file.into(),
            project: "CMIP6".into(),
            facets: Default::default(),
        });
    }

    /// The pool as the runner would build it, failing on skipped entries
    pub fn pool(&self) -> CandidatePool {
        let (pool, skipped) = CandidatePool::from_manifest(&self.manifest, &self.loader, &FacetRegistry::new());
        assert!(skipped.is_empty(), "fixture entries skipped: {:?}", skipped);
        pool
    }

    pub fn record(&self, pool: &CandidatePool, experiment: &str) -> DatasetRecord {
        pool.iter()
            .find(|r| r.experiment == experiment)
            .cloned()
            .unwrap_or_else(|| panic!("no {} in pool", experiment))
    }
}

/// The CMIP6 lineage most tests start from:
/// ssp585 (2015-2100) <- historical (1850-2014) <- piControl (1850-2349)
pub fn standard() -> Ensemble {
    Ensemble::new()
        .with(Run::new("CMIP", "piControl", 1850, 1859))
        .with(Run::new("CMIP", "historical", 1850, 2014).branched_from("CMIP", "piControl", 1850))
        .with(
            Run::new("ScenarioMIP", "ssp585", 2015, 2100)
                .branched_from("CMIP", "historical", 2015)
                .offset(0.5),
        )
}

/// Calendar years of a yearly series, read back from its time axis
pub fn years_of(cube: &Cube) -> Vec<i32> {
    cube.time
        .points
        .iter()
        .map(|&p| cube.time.units.num2date(p, cube.time.calendar).unwrap().year)
        .collect()
}
