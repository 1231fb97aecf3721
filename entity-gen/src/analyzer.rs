use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use uuid::Uuid;

use crate::common::{check_name, check_type_name, sql_str, to_pascal, to_plural, to_snake};
use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::schema::{EntityDef, PropertyDef, PropertyType, RelationshipDef, RelationshipType};

pub const ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";
pub const IS_DELETED: &str = "is_deleted";
pub const RESERVED_COLUMNS: &[&str] = &[ID, CREATED_AT, UPDATED_AT, DELETED_AT, IS_DELETED];
pub const ASSOCIATION_SUFFIX: &str = "_association";

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Name as written in the document.
    pub name: String,
    pub pascal: String,
    pub snake: String,
    /// Route segment.
    pub plural: String,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: PropertyType,
    pub nullable: bool,
    pub unique: bool,
    pub indexed: bool,
    pub default: Option<DefaultValue>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Text(String),
    Integer(i32),
    Float(f64),
    Boolean(bool),
    Datetime(DateTime<Utc>),
    Uuid(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub name: String,
    pub kind: RelationshipType,
    /// Target name as written in the document.
    pub target: String,
    pub target_pascal: String,
    pub target_snake: String,
    pub back_populates: Option<String>,
    /// Column stored on this entity (many-to-one and the owning side of one-to-one).
    pub foreign_key: Option<String>,
    /// Column stored on the target (one-to-many and the other side of one-to-one).
    pub link_column: Option<String>,
    pub association: Option<Association>,
    pub nullable: bool,
    pub description: Option<String>,
    /// The target is part of the batch and the pair is consistent.
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub table: String,
    pub local_column: String,
    pub target_column: String,
}

/// A column of the generated table, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub name: &'a str,
    pub ty: PropertyType,
    pub nullable: bool,
    pub unique: bool,
    pub indexed: bool,
    pub default: Option<&'a DefaultValue>,
    pub description: Option<&'a str>,
    pub source: ColumnSource<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource<'a> {
    Reserved,
    Property,
    ForeignKey(&'a Relationship),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntity {
    pub entity: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub entities: Vec<Entity>,
    pub skipped: Vec<SkippedEntity>,
    pub warnings: Vec<String>,
}

impl Entity {
    /// Table columns: `id`, properties, foreign keys, then the timestamp and soft delete columns.
    pub fn columns(&self) -> Vec<Column<'_>> {
        let mut columns = vec![Column::reserved(ID, PropertyType::Uuid, false)];
        columns.extend(self.properties.iter().map(|p| Column {
            name: &p.name,
            ty: p.ty,
            nullable: p.nullable,
            unique: p.unique,
            indexed: p.indexed,
            default: p.default.as_ref(),
            description: p.description.as_deref(),
            source: ColumnSource::Property,
        }));
        columns.extend(self.foreign_keys().into_iter().map(|r| Column {
            name: r.foreign_key.as_deref().unwrap_or_default(),
            ty: PropertyType::Uuid,
            nullable: r.nullable,
            unique: r.kind == RelationshipType::OneToOne,
            indexed: true,
            default: None,
            description: r.description.as_deref(),
            source: ColumnSource::ForeignKey(r),
        }));
        columns.push(Column::reserved(CREATED_AT, PropertyType::Datetime, false));
        columns.push(Column::reserved(UPDATED_AT, PropertyType::Datetime, false));
        columns.push(Column::reserved(DELETED_AT, PropertyType::Datetime, true));
        columns.push(Column::reserved(IS_DELETED, PropertyType::Boolean, false));
        columns
    }

    /// Columns a client supplies on create and update.
    pub fn input_columns(&self) -> Vec<Column<'_>> {
        self.columns()
            .into_iter()
            .filter(|c| c.source != ColumnSource::Reserved)
            .collect()
    }

    pub fn foreign_keys(&self) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.foreign_key.is_some())
            .collect()
    }

    pub fn unique_properties(&self) -> Vec<&Property> {
        self.properties.iter().filter(|p| p.unique).collect()
    }

    pub fn many_to_many(&self) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.association.is_some())
            .collect()
    }

    pub fn privilege(&self, action: &str) -> String {
        format!("{}:{}", self.snake, action)
    }
}

impl<'a> Column<'a> {
    fn reserved(name: &'a str, ty: PropertyType, nullable: bool) -> Self {
        Column {
            name,
            ty,
            nullable,
            unique: false,
            indexed: false,
            default: None,
            description: None,
            source: ColumnSource::Reserved,
        }
    }

    /// Rust type of the model field.
    pub fn rust_type(&self) -> String {
        if self.nullable {
            format!("Option<{}>", self.ty.rust_type())
        } else {
            self.ty.rust_type().to_string()
        }
    }
}

impl Property {
    pub fn rust_type(&self) -> String {
        if self.nullable {
            format!("Option<{}>", self.ty.rust_type())
        } else {
            self.ty.rust_type().to_string()
        }
    }
}

impl Relationship {
    pub fn is_owning(&self) -> bool {
        self.foreign_key.is_some()
    }
}

impl DefaultValue {
    fn parse(ty: PropertyType, value: &Value) -> Result<DefaultValue, String> {
        let parsed = match (ty, value) {
            (PropertyType::String | PropertyType::Text, Value::String(s)) => {
                if let Some(max) = ty.max_length() {
                    if s.chars().count() > max {
                        return Err(format!("default value is longer than {} characters", max));
                    }
                }
                Some(DefaultValue::Text(s.clone()))
            }
            (PropertyType::Integer, Value::Number(n)) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(DefaultValue::Integer),
            (PropertyType::Float, Value::Number(n)) => n.as_f64().map(DefaultValue::Float),
            (PropertyType::Boolean, Value::Bool(b)) => Some(DefaultValue::Boolean(*b)),
            (PropertyType::Datetime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| DefaultValue::Datetime(d.with_timezone(&Utc))),
            (PropertyType::Uuid, Value::String(s)) => Uuid::parse_str(s).ok().map(DefaultValue::Uuid),
            _ => None,
        };
        parsed.ok_or_else(|| format!("{} is not a valid {} default value", value, ty))
    }

    /// Rust expression producing the value.
    pub fn rust_expr(&self) -> String {
        match self {
            DefaultValue::Text(s) => format!("{:?}.to_string()", s),
            DefaultValue::Integer(v) => v.to_string(),
            DefaultValue::Float(v) => format!("{:?}", v),
            DefaultValue::Boolean(v) => v.to_string(),
            DefaultValue::Datetime(d) => format!(
                "DateTime::from_timestamp({}, {}).unwrap_or_default()",
                d.timestamp(),
                d.timestamp_subsec_nanos()
            ),
            DefaultValue::Uuid(u) => format!("Uuid::from_u128(0x{:032x})", u.as_u128()),
        }
    }

    /// SQL literal for a column `DEFAULT` clause.
    pub fn sql_literal(&self) -> String {
        match self {
            DefaultValue::Text(s) => sql_str(s),
            DefaultValue::Integer(v) => v.to_string(),
            DefaultValue::Float(v) => format!("{:?}", v),
            DefaultValue::Boolean(true) => "TRUE".to_string(),
            DefaultValue::Boolean(false) => "FALSE".to_string(),
            DefaultValue::Datetime(d) => sql_str(&d.to_rfc3339()),
            DefaultValue::Uuid(u) => sql_str(&u.to_string()),
        }
    }
}

/// Default join table name: both snake names in alphabetical order.
pub fn association_table_name(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}{}", first, second, ASSOCIATION_SUFFIX)
}

/// Normalizes and validates a batch, then checks relationship pairs.
pub fn analyze(defs: &[EntityDef], config: &GeneratorConfig) -> Result<Analysis> {
    if defs.is_empty() {
        return Err(GenerateError::Empty);
    }
    check_collisions(defs)?;

    let mut analysis = Analysis::default();
    let mut entities = Vec::with_capacity(defs.len());
    for def in defs {
        match resolve_entity(def, &mut analysis.warnings) {
            Ok(entity) => entities.push(entity),
            Err(err) => skip_or_abort(&mut analysis, config, &def.name, err)?,
        }
    }

    loop {
        let mut warnings = Vec::new();
        let mut links = Vec::new();
        let mut failures = Vec::new();
        for (i, entity) in entities.iter().enumerate() {
            match check_relationships(entity, &entities, config.strict, &mut warnings) {
                Ok(l) => links.push(l),
                Err(err) => failures.push((i, err)),
            }
        }
        if failures.is_empty() {
            for (entity, links) in entities.iter_mut().zip(links) {
                for (rel, (link, resolved)) in entity.relationships.iter_mut().zip(links) {
                    rel.link_column = link;
                    rel.resolved = resolved;
                }
            }
            analysis.warnings.extend(warnings);
            break;
        }
        for (i, err) in failures.into_iter().rev() {
            let entity = entities.remove(i);
            skip_or_abort(&mut analysis, config, &entity.name, err)?;
        }
    }

    for warning in &analysis.warnings {
        log::warn!("{}", warning);
    }
    analysis.entities = entities;
    Ok(analysis)
}

fn skip_or_abort(
    analysis: &mut Analysis,
    config: &GeneratorConfig,
    entity: &str,
    err: GenerateError,
) -> Result<()> {
    if !config.keep_going {
        return Err(err);
    }
    log::warn!("skipping entity `{}`: {}", entity, err);
    analysis.skipped.push(SkippedEntity {
        entity: entity.to_string(),
        reason: err.to_string(),
    });
    Ok(())
}

fn check_collisions(defs: &[EntityDef]) -> Result<()> {
    let mut snakes: HashMap<String, &str> = HashMap::new();
    let mut pascals: HashMap<String, &str> = HashMap::new();
    for def in defs {
        let snake = to_snake(&def.name);
        if let Some(other) = snakes.insert(snake.clone(), &def.name) {
            return Err(GenerateError::invalid(
                &def.name,
                "name",
                format!("normalizes to `{}` like entity `{}`", snake, other),
            ));
        }
        let pascal = to_pascal(&def.name);
        if let Some(other) = pascals.insert(pascal.clone(), &def.name) {
            return Err(GenerateError::invalid(
                &def.name,
                "name",
                format!("normalizes to `{}` like entity `{}`", pascal, other),
            ));
        }
    }
    Ok(())
}

fn resolve_entity(def: &EntityDef, warnings: &mut Vec<String>) -> Result<Entity> {
    let entity = def.name.as_str();
    let snake = to_snake(entity);
    check_name(&snake).map_err(|e| GenerateError::invalid(entity, "name", e))?;
    let pascal = to_pascal(entity);
    check_type_name(&pascal).map_err(|e| GenerateError::invalid(entity, "name", e))?;

    let mut used: HashSet<String> = RESERVED_COLUMNS.iter().map(|s| s.to_string()).collect();
    let mut properties = Vec::with_capacity(def.properties.len());
    for prop in &def.properties {
        if let Some(property) = resolve_property(entity, prop)? {
            if !used.insert(property.name.clone()) {
                return Err(GenerateError::invalid(
                    entity,
                    format!("properties.{}", prop.name),
                    format!("`{}` is reserved or already used", property.name),
                ));
            }
            properties.push(property);
        }
    }

    let mut relationships: Vec<Relationship> = Vec::with_capacity(def.relationships.len());
    for rel in &def.relationships {
        let relationship = resolve_relationship(entity, &snake, rel, warnings)?;
        let field = format!("relationships.{}", rel.name);
        if used.contains(&relationship.name)
            || relationships.iter().any(|r| r.name == relationship.name)
        {
            return Err(GenerateError::invalid(
                entity,
                field,
                format!("`{}` is already used", relationship.name),
            ));
        }
        if let Some(fk) = &relationship.foreign_key {
            if !used.insert(fk.clone()) {
                return Err(GenerateError::invalid(
                    entity,
                    field,
                    format!("foreign key column `{}` is reserved or already used", fk),
                ));
            }
        }
        relationships.push(relationship);
    }

    Ok(Entity {
        name: def.name.clone(),
        plural: to_plural(&snake),
        pascal,
        snake,
        description: def.description.clone(),
        properties,
        relationships,
    })
}

/// `None` for an `id` property, which is folded into the primary key.
fn resolve_property(entity: &str, def: &PropertyDef) -> Result<Option<Property>> {
    let field = format!("properties.{}", def.name);
    let name = to_snake(&def.name);
    check_name(&name).map_err(|e| GenerateError::invalid(entity, &field, e))?;
    let ty = PropertyType::from_str(&def.type_def).map_err(|_| {
        GenerateError::invalid(
            entity,
            format!("{}.type", field),
            format!(
                "unknown property type `{}`, expected one of {}",
                def.type_def,
                one_of::<PropertyType>()
            ),
        )
    })?;
    if name == ID {
        if ty != PropertyType::Uuid || def.is_nullable {
            return Err(GenerateError::invalid(
                entity,
                field,
                "`id` is the generated primary key and must be a non-nullable uuid",
            ));
        }
        return Ok(None);
    }
    let default = def
        .default_value
        .as_ref()
        .map(|v| DefaultValue::parse(ty, v))
        .transpose()
        .map_err(|e| GenerateError::invalid(entity, format!("{}.default_value", field), e))?;
    Ok(Some(Property {
        name,
        ty,
        nullable: def.is_nullable,
        unique: def.is_unique,
        indexed: def.is_indexed,
        default,
        description: def.description.clone(),
    }))
}

fn resolve_relationship(
    entity: &str,
    entity_snake: &str,
    def: &RelationshipDef,
    warnings: &mut Vec<String>,
) -> Result<Relationship> {
    let field = format!("relationships.{}", def.name);
    let name = to_snake(&def.name);
    check_name(&name).map_err(|e| GenerateError::invalid(entity, &field, e))?;
    let kind = RelationshipType::from_str(&def.type_def).map_err(|_| {
        GenerateError::invalid(
            entity,
            format!("{}.type", field),
            format!(
                "unknown relationship type `{}`, expected one of {}",
                def.type_def,
                one_of::<RelationshipType>()
            ),
        )
    })?;
    let target_snake = to_snake(&def.target_entity);
    check_name(&target_snake)
        .map_err(|e| GenerateError::invalid(entity, format!("{}.target_entity", field), e))?;
    let target_pascal = to_pascal(&def.target_entity);
    check_type_name(&target_pascal)
        .map_err(|e| GenerateError::invalid(entity, format!("{}.target_entity", field), e))?;

    let explicit_fk = match &def.foreign_key_column {
        Some(fk) => {
            let fk = to_snake(fk);
            check_name(&fk).map_err(|e| {
                GenerateError::invalid(entity, format!("{}.foreign_key_column", field), e)
            })?;
            Some(fk)
        }
        None => None,
    };
    let (foreign_key, link_column) = match kind {
        RelationshipType::ManyToOne => (
            Some(explicit_fk.unwrap_or_else(|| format!("{}_id", target_snake))),
            None,
        ),
        RelationshipType::OneToOne => (explicit_fk, None),
        RelationshipType::OneToMany => (None, explicit_fk),
        RelationshipType::ManyToMany => {
            if explicit_fk.is_some() {
                warnings.push(format!(
                    "entity `{}`, relationship `{}`: foreign_key_column is ignored for many-to-many",
                    entity, name
                ));
            }
            (None, None)
        }
    };

    let mut association = if kind == RelationshipType::ManyToMany {
        let table = match &def.association_table_name {
            Some(table) => {
                check_name(table).map_err(|e| {
                    GenerateError::invalid(entity, format!("{}.association_table_name", field), e)
                })?;
                table.clone()
            }
            None => association_table_name(entity_snake, &target_snake),
        };
        let local_column = format!("{}_id", entity_snake);
        let mut target_column = format!("{}_id", target_snake);
        if target_column == local_column {
            target_column = format!("related_{}", target_column);
        }
        Some(Association {
            table,
            local_column,
            target_column,
        })
    } else {
        if def.association_table_name.is_some() {
            warnings.push(format!(
                "entity `{}`, relationship `{}`: association_table_name is ignored for {}",
                entity, name, kind
            ));
        }
        None
    };

    let back_populates = match &def.back_populates {
        Some(bp) => {
            let bp = to_snake(bp);
            check_name(&bp).map_err(|e| {
                GenerateError::invalid(entity, format!("{}.back_populates", field), e)
            })?;
            Some(bp)
        }
        None => None,
    };

    // The two sides of a self-referencing pair read the association in opposite directions.
    // The side whose name sorts later takes the reversed columns.
    if let (Some(assoc), Some(back)) = (association.as_mut(), &back_populates) {
        if target_snake == entity_snake && back < &name {
            std::mem::swap(&mut assoc.local_column, &mut assoc.target_column);
        }
    }

    Ok(Relationship {
        name,
        kind,
        target: def.target_entity.clone(),
        target_pascal,
        target_snake,
        back_populates,
        foreign_key,
        link_column,
        association,
        nullable: def.is_nullable.unwrap_or(true),
        description: def.description.clone(),
        resolved: false,
    })
}

/// Checks every relationship of `entity` against the batch. Returns the link column of each
/// relationship, in order, and whether it resolved without problems.
fn check_relationships(
    entity: &Entity,
    entities: &[Entity],
    strict: bool,
    warnings: &mut Vec<String>,
) -> Result<Vec<(Option<String>, bool)>> {
    let mut links = Vec::with_capacity(entity.relationships.len());
    for rel in &entity.relationships {
        let mut problems = Vec::new();
        let mut mirror_fk = None;
        let target = entities.iter().find(|e| e.snake == rel.target_snake);
        match target {
            None => problems.push(format!(
                "target entity `{}` is not defined in this document",
                rel.target
            )),
            Some(target) => {
                if let Some(bp) = &rel.back_populates {
                    match target.relationships.iter().find(|r| &r.name == bp) {
                        None => problems.push(format!(
                            "`{}` has no relationship named `{}`",
                            target.pascal, bp
                        )),
                        Some(mirror) => {
                            check_pair(entity, rel, mirror, &mut problems);
                            mirror_fk = mirror.foreign_key.clone();
                        }
                    }
                }
            }
        }
        let link = match rel.kind {
            RelationshipType::OneToMany => Some(
                rel.link_column
                    .clone()
                    .or(mirror_fk)
                    .unwrap_or_else(|| format!("{}_id", entity.snake)),
            ),
            RelationshipType::OneToOne if rel.foreign_key.is_none() => {
                Some(mirror_fk.unwrap_or_else(|| format!("{}_id", entity.snake)))
            }
            _ => None,
        };
        if let (Some(target), Some(link)) = (target, &link) {
            let stored = target.relationships.iter().any(|r| {
                r.target_snake == entity.snake && r.foreign_key.as_ref() == Some(link)
            });
            if !stored && problems.is_empty() {
                problems.push(format!(
                    "`{}` has no foreign key column `{}` referencing `{}`",
                    target.pascal, link, entity.pascal
                ));
            }
        }
        let resolved = problems.is_empty();
        if !resolved {
            if strict {
                return Err(GenerateError::inconsistent(
                    &entity.name,
                    &rel.name,
                    problems.join("; "),
                ));
            }
            for problem in problems {
                warnings.push(format!(
                    "entity `{}`, relationship `{}`: {}",
                    entity.name, rel.name, problem
                ));
            }
        }
        links.push((link, resolved));
    }
    Ok(links)
}

fn check_pair(entity: &Entity, rel: &Relationship, mirror: &Relationship, problems: &mut Vec<String>) {
    if mirror.target_snake != entity.snake {
        problems.push(format!(
            "`{}.{}` targets `{}`, not `{}`",
            rel.target_pascal, mirror.name, mirror.target, entity.name
        ));
        return;
    }
    if mirror.kind != rel.kind.complement() {
        problems.push(format!(
            "{} is mirrored by `{}.{}` which is {}, expected {}",
            rel.kind,
            rel.target_pascal,
            mirror.name,
            mirror.kind,
            rel.kind.complement()
        ));
    }
    if let Some(back) = &mirror.back_populates {
        if back != &rel.name {
            problems.push(format!(
                "`{}.{}` back-populates `{}`, not `{}`",
                rel.target_pascal, mirror.name, back, rel.name
            ));
        }
    }
    match rel.kind {
        RelationshipType::ManyToMany => {
            if let (Some(a), Some(b)) = (&rel.association, &mirror.association) {
                if a.table != b.table {
                    problems.push(format!(
                        "association table `{}` differs from `{}` declared by `{}.{}`",
                        a.table, b.table, rel.target_pascal, mirror.name
                    ));
                }
                let symmetric = rel.target_snake == entity.snake && rel.name == mirror.name;
                if !symmetric
                    && (a.local_column != b.target_column || a.target_column != b.local_column)
                {
                    problems.push(format!(
                        "association columns ({}, {}) are not mirrored by `{}.{}` ({}, {})",
                        a.local_column,
                        a.target_column,
                        rel.target_pascal,
                        mirror.name,
                        b.local_column,
                        b.target_column
                    ));
                }
            }
        }
        RelationshipType::OneToOne if mirror.kind == RelationshipType::OneToOne => {
            if rel.is_owning() == mirror.is_owning() {
                problems.push(format!(
                    "exactly one side of a one-to-one pair must set foreign_key_column (`{}.{}`)",
                    rel.target_pascal, mirror.name
                ));
            }
        }
        RelationshipType::OneToMany if mirror.kind == RelationshipType::ManyToOne => {
            if let (Some(link), Some(fk)) = (&rel.link_column, &mirror.foreign_key) {
                if link != fk {
                    problems.push(format!(
                        "foreign_key_column `{}` differs from `{}` declared by `{}.{}`",
                        link, fk, rel.target_pascal, mirror.name
                    ));
                }
            }
        }
        _ => {}
    }
}

fn one_of<T: strum::IntoEnumIterator + std::fmt::Display>() -> String {
    T::iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}
