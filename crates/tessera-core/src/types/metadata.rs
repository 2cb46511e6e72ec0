//! Dataset-level summary metadata
//!
//! Summary metadata is never mutated in place: derive a new record with
//! [`SummaryMetadata::copy`], override fields on the builder, and `build()`.

use crate::types::coords::Coords;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable description of a dataset as a whole
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    computer_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    directory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    z_step_um: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    wait_interval_ms: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_intervals_ms: Option<Vec<f64>>,

    /// Order in which axes first took a non-zero index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    axis_order: Option<Vec<String>>,

    /// Expected extent of the dataset along each axis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intended_dimensions: Option<Coords>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    user_data: BTreeMap<String, serde_json::Value>,
}

impl SummaryMetadata {
    pub fn builder() -> SummaryMetadataBuilder {
        SummaryMetadataBuilder::default()
    }

    /// Builder that starts from this record's field values
    pub fn copy(&self) -> SummaryMetadataBuilder {
        SummaryMetadataBuilder {
            inner: self.clone(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn computer_name(&self) -> Option<&str> {
        self.computer_name.as_deref()
    }

    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    pub fn channel_names(&self) -> Option<&[String]> {
        self.channel_names.as_deref()
    }

    pub fn z_step_um(&self) -> Option<f64> {
        self.z_step_um
    }

    pub fn wait_interval_ms(&self) -> Option<f64> {
        self.wait_interval_ms
    }

    pub fn custom_intervals_ms(&self) -> Option<&[f64]> {
        self.custom_intervals_ms.as_deref()
    }

    pub fn axis_order(&self) -> Option<&[String]> {
        self.axis_order.as_deref()
    }

    pub fn intended_dimensions(&self) -> Option<&Coords> {
        self.intended_dimensions.as_ref()
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    pub fn user_data(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.user_data
    }
}

/// Copy-with-modification builder for [`SummaryMetadata`]
#[derive(Debug, Clone, Default)]
pub struct SummaryMetadataBuilder {
    inner: SummaryMetadata,
}

impl SummaryMetadataBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = Some(name.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.inner.prefix = Some(prefix.into());
        self
    }

    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.inner.user_name = Some(user_name.into());
        self
    }

    pub fn computer_name(mut self, computer_name: impl Into<String>) -> Self {
        self.inner.computer_name = Some(computer_name.into());
        self
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.inner.directory = Some(directory.into());
        self
    }

    pub fn channel_names(mut self, names: Vec<String>) -> Self {
        self.inner.channel_names = Some(names);
        self
    }

    pub fn z_step_um(mut self, step: f64) -> Self {
        self.inner.z_step_um = Some(step);
        self
    }

    pub fn wait_interval_ms(mut self, interval: f64) -> Self {
        self.inner.wait_interval_ms = Some(interval);
        self
    }

    pub fn custom_intervals_ms(mut self, intervals: Vec<f64>) -> Self {
        self.inner.custom_intervals_ms = Some(intervals);
        self
    }

    pub fn axis_order(mut self, order: Vec<String>) -> Self {
        self.inner.axis_order = Some(order);
        self
    }

    pub fn intended_dimensions(mut self, dims: Coords) -> Self {
        self.inner.intended_dimensions = Some(dims);
        self
    }

    pub fn start_date(mut self, date: DateTime<Utc>) -> Self {
        self.inner.start_date = Some(date);
        self
    }

    pub fn user_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.inner.user_data.insert(key.into(), value);
        self
    }

    pub fn build(self) -> SummaryMetadata {
        self.inner
    }
}
