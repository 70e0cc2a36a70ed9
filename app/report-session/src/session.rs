//! FILENAME: app/report-session/src/session.rs
//! View State Controller - owns one report builder session.
//!
//! The session holds the editable ReportState plus the pieces the engine
//! does not know about: persisted column state, paging, the option-list
//! cache and the save contract. Every mutation bumps `version`; the derived
//! ReportView is cached against it and only recomputed when stale.

use chrono::{DateTime, Utc};
use report_engine::packed::unpack_filter;
use report_engine::{
    calculate_report, AggregationOp, Chip, ColumnState, ColumnStateMap, DateRangeEditor,
    EditorModel, FieldDef, FieldFilter, FieldKind, FilterEditor, FilterPatch, GroupedRow,
    NumberRangeEditor, Pagination, Record, ReportDefinition, ReportError, ReportMeta,
    ReportSchema, ReportState, ReportView, SaveMode, SelectOption, SortOrder, SortState,
    SorterWire, SummaryRow, ValueListEditor,
};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::lookup::{DimensionLookup, OptionCache, OptionLoad};
use crate::sink::ReportSink;
use crate::source::RecordSource;
use crate::store::ColumnStateStore;
use crate::{log_debug, log_enter, log_error, log_exit, log_info, log_warn};

// ============================================================================
// SAVE FORM
// ============================================================================

/// What the user typed into the save dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveForm {
    pub name: String,
    pub group: String,
    pub description: String,
    pub mode: SaveMode,
}

impl SaveForm {
    pub fn new(name: &str, group: &str, mode: SaveMode) -> Self {
        SaveForm {
            name: name.to_string(),
            group: group.to_string(),
            description: String::new(),
            mode,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Name and group are required; a blank description is dropped.
    pub fn validate(&self) -> Result<ReportMeta> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name".to_string());
        }
        if self.group.trim().is_empty() {
            missing.push("group".to_string());
        }
        if !missing.is_empty() {
            return Err(SessionError::Validation(missing));
        }

        let description = self.description.trim();
        Ok(ReportMeta {
            name: self.name.trim().to_string(),
            group: self.group.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            mode: self.mode,
        })
    }
}

// ============================================================================
// SESSION
// ============================================================================

pub struct ReportSession {
    config: SessionConfig,
    schema: ReportSchema,
    records: Vec<Record>,
    state: ReportState,
    columns_state: ColumnStateMap,
    store: Box<dyn ColumnStateStore>,
    options: OptionCache,
    page: usize,
    /// Bumped on every state change.
    version: u64,
    /// Bumped by Clear All so a host can reset transient widget state.
    generation: u64,
    cached_version: u64,
    cached_view: Option<ReportView>,
    computations: u64,
}

impl ReportSession {
    /// Loads the records once and restores the persisted column state.
    pub fn new(
        config: SessionConfig,
        schema: ReportSchema,
        source: &dyn RecordSource,
        store: Box<dyn ColumnStateStore>,
    ) -> Result<Self> {
        config.validate()?;
        let records = source.records();
        let columns_state = store.get(&config.storage_key).unwrap_or_default();
        log_info!(
            "SESSION",
            "opened: {} records, {} stored column states under '{}'",
            records.len(),
            columns_state.len(),
            config.storage_key
        );

        Ok(ReportSession {
            config,
            schema,
            records,
            state: ReportState::new(),
            columns_state,
            store,
            options: OptionCache::new(),
            page: 1,
            version: 1,
            generation: 0,
            cached_version: 0,
            cached_view: None,
            computations: 0,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn schema(&self) -> &ReportSchema {
        &self.schema
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// How many times the view has actually been recomputed.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    /// Replaces one field's filter (`None` clears it). The filter shape must
    /// match the field kind.
    pub fn set_filter(&mut self, field: &str, filter: Option<FieldFilter>) -> Result<()> {
        let kind = self
            .schema
            .field(field)
            .map(|f| f.kind)
            .ok_or_else(|| ReportError::UnknownField(field.to_string()))?;
        if let Some(filter) = &filter {
            self.schema.expect_kind(field, filter.kind())?;
        }
        log_debug!("FILTER", "set {} ({}) -> {:?}", field, kind.as_str(), filter);

        self.state.filters.set(field, filter);
        self.page = 1;
        self.touch();
        Ok(())
    }

    pub fn apply_patch(&mut self, patch: FilterPatch) -> Result<()> {
        self.set_filter(&patch.field, patch.filter)
    }

    pub fn clear_filter(&mut self, field: &str) {
        if self.state.filters.remove(field).is_some() {
            self.page = 1;
            self.touch();
        }
    }

    /// Applies a filter arriving as a table widget's key list. A key that
    /// fails to decode means no filter for that field.
    pub fn apply_packed_filter(&mut self, field: &str, keys: &[String]) -> Result<()> {
        let kind = self
            .schema
            .field(field)
            .map(|f| f.kind)
            .ok_or_else(|| ReportError::UnknownField(field.to_string()))?;

        let filter = match unpack_filter(field, kind, keys) {
            Ok(filter) => filter,
            Err(e) => {
                log_warn!("FILTER", "dropping filter on {}: {}", field, e);
                None
            }
        };
        self.set_filter(field, filter)
    }

    // ------------------------------------------------------------------------
    // Grouping & aggregation
    // ------------------------------------------------------------------------

    fn expect_groupable(&self, field: &str) -> Result<()> {
        let def = self
            .schema
            .field(field)
            .ok_or_else(|| ReportError::UnknownField(field.to_string()))?;
        if !def.groupable {
            return Err(ReportError::KindMismatch {
                field: field.to_string(),
                expected: "groupable",
            }
            .into());
        }
        Ok(())
    }

    /// Appends a grouping field. Returns false when it was already grouped.
    pub fn add_group(&mut self, field: &str) -> Result<bool> {
        self.expect_groupable(field)?;
        let added = self.state.group_spec.add(field);
        if added {
            self.page = 1;
            self.touch();
        }
        Ok(added)
    }

    pub fn remove_group(&mut self, field: &str) -> bool {
        let removed = self.state.group_spec.remove(field);
        if removed {
            self.page = 1;
            self.touch();
        }
        removed
    }

    /// Replaces the whole grouping (duplicates collapse, order kept).
    pub fn set_group_fields(&mut self, fields: &[&str]) -> Result<()> {
        for field in fields {
            self.expect_groupable(field)?;
        }
        self.state.group_spec.clear();
        for field in fields {
            self.state.group_spec.add(field);
        }
        self.page = 1;
        self.touch();
        Ok(())
    }

    pub fn set_aggregation(&mut self, field: &str, op: AggregationOp) -> Result<()> {
        self.schema.expect_kind(field, FieldKind::Measure)?;
        self.state.aggregations.set(field, op);
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Sort & paging
    // ------------------------------------------------------------------------

    /// Sets the single active sort, replacing any previous one.
    pub fn set_sort(&mut self, field: &str, order: SortOrder) -> Result<()> {
        if self.schema.field(field).is_none() {
            return Err(ReportError::UnknownField(field.to_string()).into());
        }
        self.state.sorter = Some(SortState::new(field, order));
        self.touch();
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        if self.state.sorter.take().is_some() {
            self.touch();
        }
    }

    /// Applies a sort as reported by a table widget; a missing field or
    /// direction clears the sort.
    pub fn apply_sorter(&mut self, sorter: &SorterWire) -> Result<()> {
        match sorter.to_sort_state() {
            Some(sort) => self.set_sort(&sort.field, sort.order),
            None => {
                self.clear_sort();
                Ok(())
            }
        }
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.state.sorter.as_ref()
    }

    pub fn set_page(&mut self, page: usize) {
        let page = page.max(1);
        if page != self.page {
            self.page = page;
            self.touch();
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size != self.config.page_size {
            self.config.page_size = page_size;
            self.page = 1;
            self.touch();
        }
    }

    // ------------------------------------------------------------------------
    // Column state
    // ------------------------------------------------------------------------

    pub fn columns_state(&self) -> &ColumnStateMap {
        &self.columns_state
    }

    pub fn visible_columns(&self) -> Vec<&FieldDef> {
        self.schema.visible_columns(&self.columns_state)
    }

    /// Replaces the column state map and writes it through to the store.
    pub fn set_columns_state(&mut self, map: ColumnStateMap) -> Result<()> {
        self.columns_state = map;
        self.touch();
        self.persist_columns()
    }

    pub fn set_column_state(&mut self, column: &str, state: ColumnState) -> Result<()> {
        if self.schema.field(column).is_none() {
            return Err(ReportError::UnknownField(column.to_string()).into());
        }
        self.columns_state.insert(column.to_string(), state);
        self.touch();
        self.persist_columns()
    }

    pub fn set_column_visible(&mut self, column: &str, show: bool) -> Result<()> {
        let mut state = self.columns_state.get(column).cloned().unwrap_or_default();
        state.show = show;
        self.set_column_state(column, state)
    }

    fn persist_columns(&mut self) -> Result<()> {
        self.store
            .set(&self.config.storage_key, &self.columns_state)
            .map_err(|e| {
                log_error!("STORE", "failed to persist column state: {}", e);
                e
            })
    }

    // ------------------------------------------------------------------------
    // Derived view
    // ------------------------------------------------------------------------

    /// The current view, recomputed only when the state changed.
    pub fn view(&mut self) -> &ReportView {
        if self.cached_version != self.version {
            self.cached_view = None;
            self.cached_version = self.version;
        }
        let version = self.version;
        let pagination = Pagination::new(self.page, self.config.page_size);
        let (schema, records, state) = (&self.schema, &self.records, &self.state);
        let columns_state = &self.columns_state;
        let computations = &mut self.computations;

        self.cached_view.get_or_insert_with(|| {
            log_enter!("VIEW", "calculate_report", "v{}", version);
            let columns = schema.visible_columns(columns_state);
            let view = calculate_report(schema, records, state, &columns, pagination);
            log_exit!(
                "VIEW",
                "calculate_report",
                "{} of {} records, {} rows",
                view.filtered_count,
                view.source_count,
                view.rows.len()
            );
            *computations += 1;
            view
        })
    }

    pub fn page_rows(&mut self) -> &[GroupedRow] {
        self.view().page_rows()
    }

    pub fn summary_row(&mut self) -> Option<&SummaryRow> {
        self.view().summary.as_ref()
    }

    pub fn chips(&mut self) -> &[Chip] {
        &self.view().chips
    }

    pub fn remove_chip(&mut self, chip: &Chip) {
        log_debug!("CHIPS", "remove {:?} chip for {}", chip.kind, chip.key);
        report_engine::remove_chip(chip, &mut self.state);
        self.page = 1;
        self.touch();
    }

    /// Resets filters and sort; grouping and aggregation stay.
    pub fn clear_all(&mut self) {
        report_engine::clear_all(&mut self.state);
        self.page = 1;
        self.generation += 1;
        self.touch();
        log_info!("CHIPS", "cleared all (generation {})", self.generation);
    }

    // ------------------------------------------------------------------------
    // Editors & option lists
    // ------------------------------------------------------------------------

    /// The editor model for a field, filled with its current filter.
    pub fn editor_model(&self, field: &str) -> Result<EditorModel> {
        let def = self
            .schema
            .field(field)
            .ok_or_else(|| ReportError::UnknownField(field.to_string()))?;
        let filters = &self.state.filters;
        let model = match def.kind {
            FieldKind::Dimension => {
                let options = self.options.options(field).map(|o| o.to_vec());
                let current = filters.values(field).map(|v| v.to_vec());
                ValueListEditor::new(field, options).render(current.as_ref())
            }
            FieldKind::Measure => NumberRangeEditor::new(field).render(filters.number_range(field)),
            FieldKind::Date => DateRangeEditor::new(field).render(filters.date_range(field)),
        };
        Ok(model)
    }

    pub fn option_state(&self, field: &str) -> &OptionLoad {
        self.options.state(field)
    }

    pub fn options(&self, field: &str) -> Option<&[SelectOption]> {
        self.options.options(field)
    }

    /// Marks a field's option list as loading. False while a load is
    /// pending or already done.
    pub fn begin_option_load(&mut self, field: &str) -> bool {
        self.options.begin(field)
    }

    /// Fetches a field's options through `lookup`, at most once. Returns
    /// false without calling the lookup when the list is already loaded.
    pub async fn load_options(&mut self, field: &str, lookup: &dyn DimensionLookup) -> bool {
        if matches!(self.options.state(field), OptionLoad::Loaded(_)) {
            return false;
        }
        self.options.begin(field);
        let options = lookup.load_options(field).await;
        log_debug!("OPTIONS", "loaded {} options for {}", options.len(), field);
        self.options.finish(field, options);
        true
    }

    pub fn invalidate_options(&mut self, field: &str) {
        self.options.invalidate(field);
    }

    // ------------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------------

    pub fn build_definition(&self, meta: ReportMeta, created_at: DateTime<Utc>) -> ReportDefinition {
        ReportDefinition::build(
            &self.schema,
            meta,
            &self.config.data_source_id,
            created_at,
            &self.columns_state,
            self.state.sorter.as_ref(),
            &self.state.filters,
        )
    }

    /// Validates the form and submits the snapshot once.
    pub fn save(&self, form: &SaveForm, sink: &mut dyn ReportSink) -> Result<ReportDefinition> {
        self.save_at(form, sink, Utc::now())
    }

    pub fn save_at(
        &self,
        form: &SaveForm,
        sink: &mut dyn ReportSink,
        created_at: DateTime<Utc>,
    ) -> Result<ReportDefinition> {
        let meta = form.validate().map_err(|e| {
            log_warn!("SAVE", "rejected: {}", e);
            e
        })?;
        let definition = self.build_definition(meta, created_at);
        sink.submit(&definition).map_err(|e| {
            log_error!("SAVE", "submit failed: {}", e);
            SessionError::from(e)
        })?;
        log_info!(
            "SAVE",
            "saved '{}' in '{}' ({:?})",
            definition.meta.name,
            definition.meta.group,
            definition.meta.mode
        );
        Ok(definition)
    }
}
