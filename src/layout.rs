//! Anchor-relative field layout for the payslip template
//!
//! Every section is described by a static table: the labels that bound it,
//! the columns or single fields it carries, and the inset constants that turn
//! label edges into value boxes. One generic builder evaluates a table
//! against a page and yields field rectangles; nothing here reads text values.

use crate::anchor::{self, Label, Scope, TieBreak};
use crate::fields::DataType::{Currency, Date, Number, Text};
use crate::fields::{DataType, Field, FieldDescriptor, Section};
use crate::geometry::Edge::{Bottom, Left, Right, Top};
use crate::geometry::{Edge, Rect};
use crate::margins::{detect_margins, Margins};
use crate::page::PageIndex;
use crate::rows::{segment_rows, split_totals_row};
use crate::PaychequeError;
use log::{debug, info};
use std::collections::BTreeMap;

/// Vertical shrink applied to value boxes relative to their label or row
const INSET: f32 = 2.0;

/// Per-page state shared by every section builder
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    page: &'a PageIndex,
    margins: Margins,
    page_rect: Rect,
    lowest_text: f32,
}

impl<'a> PageContext<'a> {
    /// Detect margins from the page's drawings and capture page extents
    pub fn new(page: &'a PageIndex) -> Result<Self, PaychequeError> {
        let margins = detect_margins(page.drawings())?;
        Ok(Self::with_margins(page, margins))
    }

    pub fn with_margins(page: &'a PageIndex, margins: Margins) -> Self {
        let page_rect = page.page_rect();
        Self {
            page,
            margins,
            page_rect,
            lowest_text: page.lowest_text_bottom().unwrap_or(page_rect.bottom),
        }
    }

    pub fn page(&self) -> &'a PageIndex {
        self.page
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Every box matching `label`; section-scoped labels are clipped to `region`
    pub fn candidates(&self, label: &Label, region: Option<&Rect>) -> Vec<Rect> {
        let clip = match label.scope {
            Scope::Page => None,
            Scope::Section => region,
        };
        self.page.search_for(label.text, clip)
    }

    /// Resolve `label` to exactly one box
    pub fn locate(&self, label: &Label, region: Option<&Rect>) -> Result<Rect, PaychequeError> {
        anchor::resolve(label.text, &self.candidates(label, region), label.tie_break)
    }

    /// Resolve `label`, or `None` when it does not appear at all
    pub fn locate_optional(
        &self,
        label: &Label,
        region: Option<&Rect>,
    ) -> Result<Option<Rect>, PaychequeError> {
        let candidates = self.candidates(label, region);
        if candidates.is_empty() {
            return Ok(None);
        }
        anchor::resolve(label.text, &candidates, label.tie_break).map(Some)
    }
}

/// One coordinate of a derived rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Edge of a resolved label, plus an offset
    At(Label, Edge, f32),
    /// Edge of the box the field hangs off: its own label for single fields,
    /// the row delimiter for row cells, the totals label for totals cells
    Own(Edge, f32),
    LeftMargin,
    RightMargin,
    /// Page edge plus an offset
    PageLeft(f32),
    PageRight(f32),
    /// Left margin plus a third of the margin span
    FirstThird,
    /// Twice [`Bound::FirstThird`], measured from the page origin
    SecondThird,
    /// Bottom of the lowest text on the page
    LowestText,
}

/// Four bounds making up a rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectSpec {
    pub left: Bound,
    pub top: Bound,
    pub right: Bound,
    pub bottom: Bound,
}

/// A value read from one box on a labelled line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    pub data_type: DataType,
    pub label: Label,
    /// An absent label yields a field without a rectangle instead of an error
    pub optional: bool,
    pub rect: RectSpec,
}

/// One column of a repeating-row table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub field: Field,
    pub data_type: DataType,
    pub left: Bound,
    pub right: Bound,
    /// Horizontal extent on the totals line, for columns that carry a total
    pub total: Option<(Bound, Bound)>,
}

/// Where the totals line sits relative to the row-locator region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsLine {
    /// The region reaches the totals line: its delimiter is dropped and an
    /// empty region is an error
    InRowRegion,
    /// The region stops above the totals line: every delimiter is a data row
    /// and an empty region is an empty section
    BelowRowRegion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Table {
    pub columns: &'static [Column],
    pub row_region: RectSpec,
    pub delimiter: &'static str,
    pub totals_label: Label,
    pub totals_line: TotalsLine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Body {
    Fields(&'static [FieldSpec]),
    Table(Table),
}

/// Declarative description of one section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSpec {
    pub section: Section,
    /// Clip for section-scoped labels
    pub region: Option<RectSpec>,
    pub body: Body,
}

impl SectionSpec {
    /// Fields of one row, in column order
    pub fn fields(&self) -> Vec<Field> {
        match &self.body {
            Body::Fields(fields) => fields.iter().map(|f| f.field).collect(),
            Body::Table(table) => table.columns.iter().map(|c| c.field).collect(),
        }
    }
}

/// Field rectangles for a repeating-row section
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    /// One descriptor set per data row, top to bottom
    pub rows: Vec<Vec<FieldDescriptor>>,
    /// Aligned with the columns; `None` where a column has no printed total
    pub totals: Vec<Option<FieldDescriptor>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionLayout {
    Fields(Vec<FieldDescriptor>),
    Rows(RowGroup),
}

impl SectionLayout {
    /// Every descriptor in the section, totals included
    pub fn descriptors(&self) -> Vec<&FieldDescriptor> {
        match self {
            SectionLayout::Fields(fields) => fields.iter().collect(),
            SectionLayout::Rows(group) => group
                .rows
                .iter()
                .flatten()
                .chain(group.totals.iter().flatten())
                .collect(),
        }
    }
}

/// Field rectangles for the whole page, keyed by section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    sections: BTreeMap<Section, SectionLayout>,
}

impl PageLayout {
    pub fn section(&self, section: Section) -> Option<&SectionLayout> {
        self.sections.get(&section)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Section, &SectionLayout)> {
        self.sections.iter()
    }

    /// Every computed field rectangle on the page
    pub fn rects(&self) -> Vec<Rect> {
        self.sections
            .values()
            .flat_map(|layout| layout.descriptors())
            .filter_map(|d| d.rect)
            .collect()
    }
}

/// Build the layout of every section in template order
pub fn build_layout(ctx: &PageContext<'_>) -> Result<PageLayout, PaychequeError> {
    info!("Identifying coordinates of data");

    let mut sections = BTreeMap::new();
    for section in Section::ALL {
        let spec = template(section);
        sections.insert(section, build_section(ctx, &spec)?);
    }

    Ok(PageLayout { sections })
}

/// Evaluate one section table against the page
pub fn build_section(
    ctx: &PageContext<'_>,
    spec: &SectionSpec,
) -> Result<SectionLayout, PaychequeError> {
    debug!("  Identifying {} coordinates", spec.section);

    let mut frame = Frame {
        ctx,
        region: None,
        own: None,
    };
    if let Some(region) = &spec.region {
        let rect = frame.rect(region, format!("{} search region", spec.section))?;
        debug!("    Search region: {}", rect);
        frame.region = Some(rect);
    }

    match &spec.body {
        Body::Fields(fields) => fields
            .iter()
            .map(|field| frame.field(spec.section, field))
            .collect::<Result<Vec<_>, _>>()
            .map(SectionLayout::Fields),
        Body::Table(table) => frame.table(spec.section, table).map(SectionLayout::Rows),
    }
}

/// Evaluation state for one section: its search region and, while deriving a
/// field, the box the field hangs off
struct Frame<'c, 'a> {
    ctx: &'c PageContext<'a>,
    region: Option<Rect>,
    own: Option<Rect>,
}

impl<'c, 'a> Frame<'c, 'a> {
    fn with_own(&self, own: Rect) -> Self {
        Self {
            ctx: self.ctx,
            region: self.region,
            own: Some(own),
        }
    }

    fn value(&self, bound: &Bound) -> Result<f32, PaychequeError> {
        let margins = self.ctx.margins;
        let v = match *bound {
            Bound::At(label, edge, offset) => {
                self.ctx.locate(&label, self.region.as_ref())?.edge(edge) + offset
            }
            Bound::Own(edge, offset) => {
                let own = self.own.ok_or_else(|| PaychequeError::AnchorNotFound {
                    label: "(field anchor)".to_string(),
                })?;
                own.edge(edge) + offset
            }
            Bound::LeftMargin => margins.left,
            Bound::RightMargin => margins.right,
            Bound::PageLeft(offset) => self.ctx.page_rect.left + offset,
            Bound::PageRight(offset) => self.ctx.page_rect.right + offset,
            Bound::FirstThird => margins.left + margins.span() / 3.0,
            Bound::SecondThird => (margins.left + margins.span() / 3.0) * 2.0,
            Bound::LowestText => self.ctx.lowest_text,
        };
        Ok(v)
    }

    fn rect(&self, spec: &RectSpec, context: impl Into<String>) -> Result<Rect, PaychequeError> {
        Rect::new(
            self.value(&spec.left)?,
            self.value(&spec.top)?,
            self.value(&spec.right)?,
            self.value(&spec.bottom)?,
        )
        .validated(context)
    }

    /// A box spanning `left..right` on the own box's line, inset vertically
    fn cell(
        &self,
        left: Bound,
        right: Bound,
        context: impl Into<String>,
    ) -> Result<Rect, PaychequeError> {
        let spec = RectSpec {
            left,
            top: Bound::Own(Edge::Top, INSET),
            right,
            bottom: Bound::Own(Edge::Bottom, -INSET),
        };
        self.rect(&spec, context)
    }

    fn cell_descriptor(
        &self,
        column: &Column,
        left: Bound,
        right: Bound,
        context: String,
    ) -> Result<FieldDescriptor, PaychequeError> {
        Ok(FieldDescriptor {
            field: column.field,
            rect: Some(self.cell(left, right, context)?),
            data_type: column.data_type,
        })
    }

    fn field(&self, section: Section, spec: &FieldSpec) -> Result<FieldDescriptor, PaychequeError> {
        let own = if spec.optional {
            self.ctx.locate_optional(&spec.label, self.region.as_ref())?
        } else {
            Some(self.ctx.locate(&spec.label, self.region.as_ref())?)
        };

        let rect = match own {
            Some(own) => Some(
                self.with_own(own)
                    .rect(&spec.rect, format!("{} - {}", section, spec.field))?,
            ),
            None => {
                debug!("    Optional label \"{}\" not present", spec.label.text);
                None
            }
        };

        Ok(FieldDescriptor {
            field: spec.field,
            rect,
            data_type: spec.data_type,
        })
    }

    fn table(&self, section: Section, table: &Table) -> Result<RowGroup, PaychequeError> {
        let row_region = self.rect(&table.row_region, format!("{} row region", section))?;

        let found = match segment_rows(self.ctx.page, &row_region, table.delimiter) {
            Ok(found) => found,
            Err(PaychequeError::NoRowsFound { .. })
                if table.totals_line == TotalsLine::BelowRowRegion =>
            {
                debug!("    No rows in {}", section);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let row_boxes = match table.totals_line {
            TotalsLine::InRowRegion => split_totals_row(found).0,
            TotalsLine::BelowRowRegion => found,
        };
        debug!("    {} data rows", row_boxes.len());

        let mut rows = Vec::with_capacity(row_boxes.len());
        for (index, row) in row_boxes.iter().enumerate() {
            let frame = self.with_own(*row);
            let cells = table
                .columns
                .iter()
                .map(|column| {
                    frame.cell_descriptor(
                        column,
                        column.left,
                        column.right,
                        format!("{} row {} - {}", section, index, column.field),
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }

        let totals_anchor = self.ctx.locate(&table.totals_label, self.region.as_ref())?;
        let frame = self.with_own(totals_anchor);
        let totals = table
            .columns
            .iter()
            .map(|column| {
                column
                    .total
                    .map(|(left, right)| {
                        frame.cell_descriptor(
                            column,
                            left,
                            right,
                            format!("{} total - {}", section, column.field),
                        )
                    })
                    .transpose()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RowGroup { rows, totals })
    }
}

// ============================================================================
// Template tables
// ============================================================================

const fn at(label: Label, edge: Edge, offset: f32) -> Bound {
    Bound::At(label, edge, offset)
}

const fn own(edge: Edge, offset: f32) -> Bound {
    Bound::Own(edge, offset)
}

/// A value box on its label's line, spanning `left..right`
const fn beside(
    field: Field,
    data_type: DataType,
    label: Label,
    left: Bound,
    right: Bound,
) -> FieldSpec {
    FieldSpec {
        field,
        data_type,
        label,
        optional: false,
        rect: RectSpec {
            left,
            top: own(Edge::Top, INSET),
            right,
            bottom: own(Edge::Bottom, -INSET),
        },
    }
}

const fn optional(spec: FieldSpec) -> FieldSpec {
    FieldSpec {
        optional: true,
        ..spec
    }
}

const fn column(field: Field, data_type: DataType, left: Bound, right: Bound) -> Column {
    Column {
        field,
        data_type,
        left,
        right,
        total: None,
    }
}

/// A column whose totals cell spans the same columns as its rows
const fn totalled(field: Field, data_type: DataType, left: Bound, right: Bound) -> Column {
    Column {
        field,
        data_type,
        left,
        right,
        total: Some((left, right)),
    }
}

const fn region(left: Bound, top: Bound, right: Bound, bottom: Bound) -> RectSpec {
    RectSpec {
        left,
        top,
        right,
        bottom,
    }
}

// Page-wide labels
const PAY_BEGIN_DATE: Label = Label::page("Pay Begin Date:");
const PAY_END_DATE: Label = Label::page("Pay End Date:");
const ADVICE_NUMBER: Label = Label::page("Advice #:");
const ADVICE_DATE: Label = Label::page("Advice Date:");
const EMPLOYEE_ID: Label = Label::page("Employee ID:");
const DEPARTMENT: Label = Label::page("Department:");
const LOCATION: Label = Label::page("Location:");
const JOB_TITLE: Label = Label::page("Job Title:");
const PAY_RATE: Label = Label::page("Pay Rate:");
const TAX_DATA: Label = Label::page("TAX DATA:");
const QUEBEC: Label = Label::page("Quebec");
const NET_CLAIM_AMOUNT: Label = Label::page("Net Claim Amount:");
const SPECIAL_LETTERS: Label = Label::page("Special Letters:");
const ADDITIONAL_PERCENT: Label = Label::page("Addl. Percent:");
const ADDITIONAL_AMOUNT: Label = Label::page("Addl. Amount:");
const HOURS_AND_EARNINGS: Label = Label::page("HOURS AND EARNINGS");
const TAXES: Label = Label::page("TAXES").pick(TieBreak::Top);
const BEFORE_TAX_DEDUCTIONS: Label = Label::page("BEFORE-TAX DEDUCTIONS");
const AFTER_TAX_DEDUCTIONS: Label = Label::page("AFTER-TAX DEDUCTIONS");
const EMPLOYER_PAID_BENEFITS: Label = Label::page("EMPLOYER PAID BENEFITS");
const CIT_TAXABLE_GROSS: Label = Label::page("CIT TAXABLE GROSS");
const VACATION_ACCRUAL: Label = Label::page("Vacation Accrual");
const YTD_BANK_BALANCES: Label = Label::page("YTD Bank Balances");
const YTD_OT_BANK: Label = Label::page("YTD OT Bank");
const YTD_SICK_BANK: Label = Label::page("YTD Sick Bank");
const YTD_STAT_BANK: Label = Label::page("YTD Stat Bank");
const YTD_FLOAT_BANK: Label = Label::page("YTD Float Bank");
const ADVANCE_OUTSTANDING: Label = Label::page("Advance Outstanding");
const OS_ADVANCE: Label = Label::page("OS/Advance");
const DIRECT_DEPOSIT: Label = Label::page("DIRECT DEPOSIT DISTRIBUTION");
const NET_PAY_DISTRIBUTION: Label = Label::page("NET PAY DISTRIBUTION");
/// The totals line under the deposit and distribution tables
const BOTTOM_TOTAL: Label = Label::page("TOTAL").pick(TieBreak::Bottom);

// Section-scoped labels
const DESCRIPTION: Label = Label::section("Description");
const RATE: Label = Label::section("Rate");
const HOURS_CURRENT: Label = Label::section("Hours").pick(TieBreak::Left);
const HOURS_YTD: Label = Label::section("Hours").pick(TieBreak::Right);
const EARNINGS_CURRENT: Label = Label::section("Earnings").pick(TieBreak::Left);
const EARNINGS_YTD: Label = Label::section("Earnings").pick(TieBreak::Right);
const CURRENT: Label = Label::section("Current");
const YTD: Label = Label::section("YTD");
const LEDGER_TOTAL: Label = Label::section("TOTAL:").pick(TieBreak::Bottom);
const TOTAL_GROSS: Label = Label::section("TOTAL GROSS");
const TOTAL_TAXES: Label = Label::section("TOTAL TAXES");
const TOTAL_DEDUCTIONS: Label = Label::section("TOTAL DEDUCTIONS");
const NET_PAY: Label = Label::section("NET PAY");
const CURRENT_ROW: Label = Label::section("Current:");
const YTD_ROW: Label = Label::section("YTD:");
const SUPPLEMENTAL: Label = Label::section("supplemental");
const NEXT_YEAR: Label = Label::section("Next Year:");
const ACCOUNT_TYPE: Label = Label::section("Account Type");
const DEPOSIT_AMOUNT: Label = Label::section("Deposit Amount");
const MESSAGE: Label = Label::section("MESSAGE").pick(TieBreak::Top);

const PAY_ADVICE_FIELDS: &[FieldSpec] = &[
    beside(Field::PayBeginDate, Date, PAY_BEGIN_DATE, own(Right, 2.0), at(ADVICE_NUMBER, Left, -5.0)),
    beside(Field::PayEndDate, Date, PAY_END_DATE, own(Right, 2.0), at(ADVICE_NUMBER, Left, -5.0)),
    beside(Field::AdviceNumber, Text, ADVICE_NUMBER, own(Right, 2.0), Bound::RightMargin),
    beside(Field::AdviceDate, Date, ADVICE_DATE, own(Right, 2.0), Bound::RightMargin),
];

const DEMOGRAPHIC_FIELDS: &[FieldSpec] = &[
    beside(Field::EmployeeId, Text, EMPLOYEE_ID, at(EMPLOYEE_ID, Right, 2.0), at(TAX_DATA, Left, -5.0)),
    beside(Field::Department, Text, DEPARTMENT, at(EMPLOYEE_ID, Right, 2.0), at(TAX_DATA, Left, -5.0)),
    beside(Field::Location, Text, LOCATION, at(EMPLOYEE_ID, Right, 2.0), at(TAX_DATA, Left, -5.0)),
    beside(Field::JobTitle, Text, JOB_TITLE, at(EMPLOYEE_ID, Right, 2.0), at(TAX_DATA, Left, -5.0)),
    beside(Field::PayRate, Currency, PAY_RATE, at(EMPLOYEE_ID, Right, 2.0), at(TAX_DATA, Left, -5.0)),
];

const FEDERAL_RIGHT: Bound = at(QUEBEC, Left, -5.0);
const ALBERTA_LEFT: Bound = at(QUEBEC, Right, 5.0);

const TAX_DATA_FIELDS: &[FieldSpec] = &[
    beside(Field::FederalNetClaimAmount, Currency, NET_CLAIM_AMOUNT, own(Right, 2.0), FEDERAL_RIGHT),
    beside(Field::FederalSpecialLetters, Currency, SPECIAL_LETTERS, own(Right, 2.0), FEDERAL_RIGHT),
    beside(Field::FederalAdditionalPercent, Number, ADDITIONAL_PERCENT, own(Right, 2.0), FEDERAL_RIGHT),
    beside(Field::FederalAdditionalAmount, Currency, ADDITIONAL_AMOUNT, own(Right, 2.0), FEDERAL_RIGHT),
    beside(Field::AlbertaNetClaimAmount, Currency, NET_CLAIM_AMOUNT, ALBERTA_LEFT, Bound::RightMargin),
    beside(Field::AlbertaSpecialLetters, Currency, SPECIAL_LETTERS, ALBERTA_LEFT, Bound::RightMargin),
    beside(Field::AlbertaAdditionalPercent, Number, ADDITIONAL_PERCENT, ALBERTA_LEFT, Bound::RightMargin),
    beside(Field::AlbertaAdditionalAmount, Currency, ADDITIONAL_AMOUNT, ALBERTA_LEFT, Bound::RightMargin),
];

const HOURS_COLUMNS: &[Column] = &[
    column(Field::Description, Text, at(DESCRIPTION, Left, -1.0), at(RATE, Left, -30.0)),
    column(Field::RateCurrent, Currency, at(RATE, Left, -20.0), at(RATE, Right, 2.0)),
    totalled(Field::HoursCurrent, Number, at(RATE, Right, 4.0), at(HOURS_CURRENT, Right, 2.0)),
    totalled(Field::EarningsCurrent, Currency, at(HOURS_CURRENT, Right, 4.0), at(EARNINGS_CURRENT, Right, 2.0)),
    totalled(Field::HoursYtd, Number, at(EARNINGS_CURRENT, Right, 4.0), at(HOURS_YTD, Right, 2.0)),
    totalled(Field::EarningsYtd, Currency, at(HOURS_YTD, Right, 4.0), at(EARNINGS_YTD, Right, 2.0)),
];

const TAXES_COLUMNS: &[Column] = &[
    column(Field::Description, Text, at(DESCRIPTION, Left, -1.0), at(CURRENT, Left, -30.0)),
    totalled(Field::Current, Currency, at(CURRENT, Left, -20.0), at(CURRENT, Right, 2.0)),
    totalled(Field::Ytd, Currency, at(CURRENT, Right, 4.0), at(YTD, Right, 2.0)),
];

/// Before-tax, after-tax and employer-paid ledgers: the current total is read
/// from a narrower box than the current rows
const DEDUCTION_COLUMNS: &[Column] = &[
    column(Field::Description, Text, at(DESCRIPTION, Left, -1.0), at(CURRENT, Left, -30.0)),
    Column {
        total: Some((at(CURRENT, Right, -20.0), at(CURRENT, Right, 2.0))),
        ..column(Field::Current, Currency, at(CURRENT, Left, -20.0), at(CURRENT, Right, 2.0))
    },
    totalled(Field::Ytd, Currency, at(CURRENT, Right, 4.0), at(YTD, Right, 2.0)),
];

const DEDUCTION_ROWS: RectSpec = region(
    at(CURRENT, Right, 4.0),
    at(YTD, Bottom, 0.0),
    at(YTD, Right, 0.0),
    at(CIT_TAXABLE_GROSS, Top, -5.0),
);

const DEDUCTION_TABLE: Table = Table {
    columns: DEDUCTION_COLUMNS,
    row_region: DEDUCTION_ROWS,
    delimiter: ".",
    totals_label: LEDGER_TOTAL,
    totals_line: TotalsLine::InRowRegion,
};

const fn gross_and_net_row(
    label: Label,
    fields: [Field; 5],
) -> [FieldSpec; 5] {
    [
        beside(fields[0], Currency, label, own(Right, 2.0), at(TOTAL_GROSS, Right, 2.0)),
        beside(fields[1], Currency, label, at(TOTAL_GROSS, Right, 4.0), at(CIT_TAXABLE_GROSS, Right, 2.0)),
        beside(fields[2], Currency, label, at(CIT_TAXABLE_GROSS, Right, 4.0), at(TOTAL_TAXES, Right, 2.0)),
        beside(fields[3], Currency, label, at(TOTAL_TAXES, Right, 4.0), at(TOTAL_DEDUCTIONS, Right, 2.0)),
        beside(fields[4], Currency, label, at(TOTAL_DEDUCTIONS, Right, 4.0), at(NET_PAY, Right, 2.0)),
    ]
}

const GROSS_CURRENT: [FieldSpec; 5] = gross_and_net_row(
    CURRENT_ROW,
    [
        Field::CurrentTotalGross,
        Field::CurrentCitTaxableGross,
        Field::CurrentTotalTaxes,
        Field::CurrentTotalDeductions,
        Field::CurrentNetPay,
    ],
);

const GROSS_YTD: [FieldSpec; 5] = gross_and_net_row(
    YTD_ROW,
    [
        Field::YtdTotalGross,
        Field::YtdCitTaxableGross,
        Field::YtdTotalTaxes,
        Field::YtdTotalDeductions,
        Field::YtdNetPay,
    ],
);

const GROSS_AND_NET_FIELDS: &[FieldSpec] = &[
    GROSS_CURRENT[0],
    GROSS_CURRENT[1],
    GROSS_CURRENT[2],
    GROSS_CURRENT[3],
    GROSS_CURRENT[4],
    GROSS_YTD[0],
    GROSS_YTD[1],
    GROSS_YTD[2],
    GROSS_YTD[3],
    GROSS_YTD[4],
];

const VACATION_FIELDS: &[FieldSpec] = &[
    beside(Field::VacationCurrent, Number, CURRENT_ROW, own(Right, 2.0), at(YTD_BANK_BALANCES, Left, -4.0)),
    beside(Field::VacationSupplemental, Number, SUPPLEMENTAL, own(Right, 4.0), at(YTD_BANK_BALANCES, Left, -4.0)),
    optional(beside(Field::VacationNextYear, Number, NEXT_YEAR, own(Right, 4.0), at(YTD_BANK_BALANCES, Left, -4.0))),
];

const BANK_BALANCE_FIELDS: &[FieldSpec] = &[
    beside(Field::YtdOtBank, Number, YTD_OT_BANK, own(Right, 4.0), at(ADVANCE_OUTSTANDING, Left, -4.0)),
    beside(Field::YtdSickBank, Number, YTD_SICK_BANK, own(Right, 4.0), at(ADVANCE_OUTSTANDING, Left, -4.0)),
    beside(Field::YtdStatBank, Number, YTD_STAT_BANK, own(Right, 4.0), at(ADVANCE_OUTSTANDING, Left, -4.0)),
    beside(Field::YtdFloatBank, Number, YTD_FLOAT_BANK, own(Right, 4.0), at(ADVANCE_OUTSTANDING, Left, -4.0)),
];

const ADVANCE_FIELDS: &[FieldSpec] = &[beside(
    Field::OsAdvance,
    Currency,
    OS_ADVANCE,
    own(Right, 4.0),
    at(DIRECT_DEPOSIT, Left, -4.0),
)];

const DIRECT_DEPOSIT_COLUMNS: &[Column] = &[
    column(Field::AccountType, Text, at(ACCOUNT_TYPE, Left, -1.0), at(DEPOSIT_AMOUNT, Left, -4.0)),
    totalled(Field::DepositAmount, Currency, at(DEPOSIT_AMOUNT, Left, 0.0), at(DEPOSIT_AMOUNT, Right, 0.0)),
];

const NET_PAY_DISTRIBUTION_COLUMNS: &[Column] = &[
    column(
        Field::AdviceNumberReference,
        Text,
        at(NET_PAY_DISTRIBUTION, Left, -1.0),
        at(NET_PAY_DISTRIBUTION, Right, 6.0),
    ),
    Column {
        total: Some((own(Right, 10.0), Bound::RightMargin)),
        ..column(Field::Amount, Currency, at(NET_PAY_DISTRIBUTION, Right, 10.0), Bound::RightMargin)
    },
];

const NET_PAY_DISTRIBUTION_REGION: RectSpec = region(
    at(NET_PAY_DISTRIBUTION, Left, -2.0),
    at(NET_PAY_DISTRIBUTION, Bottom, -2.0),
    Bound::RightMargin,
    at(BOTTOM_TOTAL, Top, -5.0),
);

const MESSAGE_FIELDS: &[FieldSpec] = &[FieldSpec {
    field: Field::Message,
    data_type: Text,
    label: MESSAGE,
    optional: false,
    rect: region(own(Left, 0.0), own(Top, 0.0), Bound::RightMargin, Bound::LowestText),
}];

/// The declarative table for `section`
pub fn template(section: Section) -> SectionSpec {
    let (region, body) = match section {
        Section::PaychequeDetails => (None, Body::Fields(PAY_ADVICE_FIELDS)),
        Section::BaselineDetails => (None, Body::Fields(DEMOGRAPHIC_FIELDS)),
        Section::TaxData => (None, Body::Fields(TAX_DATA_FIELDS)),
        Section::HoursAndEarnings => (
            Some(region(
                Bound::PageLeft(5.0),
                at(HOURS_AND_EARNINGS, Bottom, -2.0),
                at(TAX_DATA, Left, -5.0),
                at(BEFORE_TAX_DEDUCTIONS, Top, -5.0),
            )),
            Body::Table(Table {
                columns: HOURS_COLUMNS,
                row_region: region(
                    at(EARNINGS_YTD, Left, 0.0),
                    at(EARNINGS_YTD, Bottom, 0.0),
                    at(EARNINGS_YTD, Right, 0.0),
                    at(BEFORE_TAX_DEDUCTIONS, Top, -5.0),
                ),
                delimiter: ".",
                totals_label: LEDGER_TOTAL,
                totals_line: TotalsLine::InRowRegion,
            }),
        ),
        Section::Taxes => (
            Some(region(
                at(TAX_DATA, Left, -2.0),
                at(TAXES, Bottom, -2.0),
                Bound::PageRight(-5.0),
                at(EMPLOYER_PAID_BENEFITS, Top, -5.0),
            )),
            Body::Table(Table {
                columns: TAXES_COLUMNS,
                row_region: region(
                    at(CURRENT, Right, 4.0),
                    at(YTD, Bottom, 0.0),
                    at(YTD, Right, 0.0),
                    at(EMPLOYER_PAID_BENEFITS, Top, -5.0),
                ),
                delimiter: ".",
                totals_label: LEDGER_TOTAL,
                totals_line: TotalsLine::InRowRegion,
            }),
        ),
        Section::BeforeTaxDeductions => (
            Some(region(
                Bound::LeftMargin,
                at(BEFORE_TAX_DEDUCTIONS, Bottom, 2.0),
                Bound::FirstThird,
                at(CIT_TAXABLE_GROSS, Top, -5.0),
            )),
            Body::Table(DEDUCTION_TABLE),
        ),
        Section::AfterTaxDeductions => (
            Some(region(
                Bound::FirstThird,
                at(AFTER_TAX_DEDUCTIONS, Bottom, 2.0),
                Bound::SecondThird,
                at(CIT_TAXABLE_GROSS, Top, -5.0),
            )),
            Body::Table(DEDUCTION_TABLE),
        ),
        Section::EmployerPaidBenefits => (
            Some(region(
                at(TAX_DATA, Left, -2.0),
                at(EMPLOYER_PAID_BENEFITS, Bottom, 2.0),
                Bound::RightMargin,
                at(CIT_TAXABLE_GROSS, Top, -5.0),
            )),
            Body::Table(DEDUCTION_TABLE),
        ),
        Section::GrossAndNet => (
            Some(region(
                Bound::LeftMargin,
                at(CIT_TAXABLE_GROSS, Top, 0.0),
                Bound::RightMargin,
                at(DIRECT_DEPOSIT, Top, -5.0),
            )),
            Body::Fields(GROSS_AND_NET_FIELDS),
        ),
        Section::Vacation => (
            Some(region(
                Bound::LeftMargin,
                at(VACATION_ACCRUAL, Bottom, -2.0),
                at(YTD_BANK_BALANCES, Left, -4.0),
                at(BOTTOM_TOTAL, Top, -5.0),
            )),
            Body::Fields(VACATION_FIELDS),
        ),
        Section::BankBalances => (None, Body::Fields(BANK_BALANCE_FIELDS)),
        Section::AdvanceOutstanding => (None, Body::Fields(ADVANCE_FIELDS)),
        Section::DirectDepositDistribution => (
            Some(region(
                at(DIRECT_DEPOSIT, Left, -2.0),
                at(DIRECT_DEPOSIT, Bottom, -2.0),
                at(NET_PAY_DISTRIBUTION, Left, -4.0),
                at(BOTTOM_TOTAL, Top, -5.0),
            )),
            Body::Table(Table {
                columns: DIRECT_DEPOSIT_COLUMNS,
                row_region: region(
                    at(DEPOSIT_AMOUNT, Left, 0.0),
                    at(DEPOSIT_AMOUNT, Bottom, 0.0),
                    at(DEPOSIT_AMOUNT, Right, 0.0),
                    at(BOTTOM_TOTAL, Top, -5.0),
                ),
                delimiter: ".",
                totals_label: BOTTOM_TOTAL,
                totals_line: TotalsLine::BelowRowRegion,
            }),
        ),
        Section::NetPayDistribution => (
            Some(NET_PAY_DISTRIBUTION_REGION),
            Body::Table(Table {
                columns: NET_PAY_DISTRIBUTION_COLUMNS,
                row_region: NET_PAY_DISTRIBUTION_REGION,
                delimiter: "Advice",
                totals_label: BOTTOM_TOTAL,
                totals_line: TotalsLine::BelowRowRegion,
            }),
        ),
        Section::Message => (
            Some(region(
                Bound::LeftMargin,
                at(BOTTOM_TOTAL, Bottom, 5.0),
                Bound::RightMargin,
                Bound::LowestText,
            )),
            Body::Fields(MESSAGE_FIELDS),
        ),
    };

    SectionSpec {
        section,
        region,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{Glyph, PathItem};

    fn word(text: &str, x: f32, baseline: f32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let left = x + i as f32 * 4.0;
                Glyph::new(
                    c.to_string(),
                    Rect::new(left, baseline - 6.4, left + 4.0, baseline + 1.6),
                )
            })
            .collect()
    }

    fn page(words: &[(&str, f32, f32)]) -> PageIndex {
        let glyphs = words
            .iter()
            .flat_map(|(t, x, y)| word(t, *x, *y))
            .collect();
        let rule = PathItem::Line {
            x0: 20.0,
            y0: 10.0,
            x1: 600.0,
            y1: 10.0,
        };
        PageIndex::from_parts(Rect::new(0.0, 0.0, 612.0, 792.0), glyphs, vec![rule])
    }

    fn pay_advice_page() -> PageIndex {
        page(&[
            ("Pay Begin Date:", 20.0, 40.0),
            ("01/01/2024", 90.0, 40.0),
            ("Advice #:", 300.0, 40.0),
            ("123456", 345.0, 40.0),
            ("Pay End Date:", 20.0, 52.0),
            ("01/14/2024", 90.0, 52.0),
            ("Advice Date:", 300.0, 52.0),
            ("01/19/2024", 355.0, 52.0),
        ])
    }

    fn fields(layout: SectionLayout) -> Vec<FieldDescriptor> {
        match layout {
            SectionLayout::Fields(f) => f,
            other => panic!("expected fields, got {:?}", other),
        }
    }

    #[test]
    fn test_pay_advice_boxes_follow_labels() {
        let idx = pay_advice_page();
        let ctx = PageContext::new(&idx).unwrap();
        let layout = fields(build_section(&ctx, &template(Section::PaychequeDetails)).unwrap());

        let begin = layout[0].rect.unwrap();
        // "Pay Begin Date:" spans 20..80, "Advice #:" starts at 300
        assert!((begin.left - 82.0).abs() < 1e-3);
        assert!((begin.right - 295.0).abs() < 1e-3);
        assert!((begin.top - (33.6 + 2.0)).abs() < 1e-3);
        assert!((begin.bottom - (41.6 - 2.0)).abs() < 1e-3);

        let advice = layout[2].rect.unwrap();
        assert_eq!(advice.right, 600.0);
        assert_eq!(idx.textbox(&begin), "01/01/2024");
        assert_eq!(idx.textbox(&advice), "123456");
    }

    #[test]
    fn test_missing_anchor_is_fatal() {
        let idx = page(&[("Pay Begin Date:", 20.0, 40.0)]);
        let ctx = PageContext::new(&idx).unwrap();
        let err = build_section(&ctx, &template(Section::PaychequeDetails)).unwrap_err();
        assert!(matches!(err, PaychequeError::AnchorNotFound { label } if label == "Advice #:"));
    }

    #[test]
    fn test_margin_thirds() {
        let idx = page(&[]);
        let ctx = PageContext::new(&idx).unwrap();
        let frame = Frame {
            ctx: &ctx,
            region: None,
            own: None,
        };
        let first = frame.value(&Bound::FirstThird).unwrap();
        let second = frame.value(&Bound::SecondThird).unwrap();
        assert!((first - (20.0 + 580.0 / 3.0)).abs() < 1e-3);
        assert!((second - 2.0 * first).abs() < 1e-3);
    }

    #[test]
    fn test_inverted_box_surfaces_as_error() {
        // Quebec printed left of the tax labels leaves the federal box inverted
        let idx = page(&[
            ("Quebec", 300.0, 70.0),
            ("Net Claim Amount:", 425.0, 82.0),
            ("Special Letters:", 425.0, 94.0),
            ("Addl. Percent:", 425.0, 106.0),
            ("Addl. Amount:", 425.0, 118.0),
        ]);
        let ctx = PageContext::new(&idx).unwrap();
        let err = build_section(&ctx, &template(Section::TaxData)).unwrap_err();
        assert!(matches!(err, PaychequeError::InvertedRect { .. }));
    }

    #[test]
    fn test_optional_label_yields_no_rect() {
        let base = [
            ("Vacation Accrual", 20.0, 340.0),
            ("YTD Bank Balances", 120.0, 340.0),
            ("Current:", 20.0, 352.0),
            ("80.00", 70.0, 352.0),
            ("Supplemental:", 20.0, 364.0),
            ("5.00", 80.0, 364.0),
            ("TOTAL", 302.0, 400.0),
        ];
        let idx = page(&base);
        let ctx = PageContext::new(&idx).unwrap();
        let layout = fields(build_section(&ctx, &template(Section::Vacation)).unwrap());
        assert_eq!(layout.len(), 3);
        assert!(layout[0].rect.is_some());
        assert_eq!(layout[2].field, Field::VacationNextYear);
        assert_eq!(layout[2].rect, None);

        let mut with_next = base.to_vec();
        with_next.push(("Next Year:", 20.0, 376.0));
        with_next.push(("40.00", 70.0, 376.0));
        let idx = page(&with_next);
        let ctx = PageContext::new(&idx).unwrap();
        let layout = fields(build_section(&ctx, &template(Section::Vacation)).unwrap());
        assert_eq!(idx.textbox(&layout[2].rect.unwrap()), "40.00");
    }

    #[test]
    fn test_every_section_has_a_template() {
        for section in Section::ALL {
            let spec = template(section);
            assert_eq!(spec.section, section);
            let has_section_labels = match spec.body {
                Body::Fields(fields) => fields.iter().any(|f| f.label.scope == Scope::Section),
                Body::Table(_) => true,
            };
            if has_section_labels {
                assert!(spec.region.is_some(), "{} needs a search region", section);
            }
        }
    }
}
