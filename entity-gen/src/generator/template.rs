use askama::Template;
use convert_case::{Case, Casing};

use crate::analyzer::{Association, Column, ColumnSource, Entity, Relationship};
use crate::ddl::Statements;
use crate::filters::{self, _doc, _raw_str, _to_var_name};
use crate::schema::RelationshipType;

pub const ACTIONS: [&str; 4] = ["create", "read", "update", "delete"];

#[derive(Template)]
#[template(path = "model.rs", escape = "none")]
pub struct ModelTemplate<'a> {
    pub e: &'a EntityView<'a>,
}

#[derive(Template)]
#[template(path = "schema.rs", escape = "none")]
pub struct SchemaTemplate<'a> {
    pub e: &'a EntityView<'a>,
}

#[derive(Template)]
#[template(path = "router.rs", escape = "none")]
pub struct RouterTemplate<'a> {
    pub e: &'a EntityView<'a>,
}

#[derive(Template)]
#[template(path = "service.rs", escape = "none")]
pub struct ServiceTemplate<'a> {
    pub e: &'a EntityView<'a>,
}

#[derive(Template)]
#[template(path = "repository.rs", escape = "none")]
pub struct RepositoryTemplate<'a> {
    pub e: &'a EntityView<'a>,
}

#[derive(Template)]
#[template(path = "registry.rs", escape = "none")]
pub struct RegistryTemplate<'a> {
    pub modules: &'a [String],
    pub routes: bool,
}

#[derive(Template)]
#[template(path = "privileges.sql", escape = "none")]
pub struct PrivilegesTemplate<'a> {
    pub rows: &'a [PrivilegeRow],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub entity: String,
    pub action: String,
}

/// Everything the per-entity templates read, derived once per entity.
pub struct EntityView<'a> {
    pub entity: &'a Entity,
    pub pascal: &'a str,
    /// Module path segment, raw-escaped when needed.
    pub module: String,
    pub plural: &'a str,
    pub sql: Statements<'a>,
    /// Every table column, for the model.
    pub columns: Vec<Field<'a>>,
    /// Columns a client supplies.
    pub fields: Vec<Field<'a>>,
    pub lookups: Vec<Lookup<'a>>,
    pub foreign_keys: Vec<Field<'a>>,
    pub relationships: Vec<RelationshipModule>,
    pub parents: Vec<Nav<'a>>,
    pub children: Vec<Nav<'a>>,
    pub singles: Vec<Nav<'a>>,
    pub linked: Vec<Nav<'a>>,
    pub default_fns: Vec<String>,
}

pub struct Field<'a> {
    /// Rust field name.
    pub name: String,
    pub column: &'a str,
    pub const_name: String,
    pub ty: String,
    pub update_ty: String,
    pub param_ty: String,
    pub nullable: bool,
    pub borrowed: bool,
    pub max_length: Option<usize>,
    pub default_expr: Option<String>,
    pub description: Option<&'a str>,
}

/// Lookup through a unique column, with the input expressions yielding the value to check.
pub struct Lookup<'a> {
    pub field: Field<'a>,
    pub create_value: String,
    pub update_value: String,
}

/// Navigation to the target of a resolved relationship.
pub struct Nav<'a> {
    pub name: &'a str,
    pub target_pascal: &'a str,
    pub target_module: String,
    pub target_privilege: String,
    /// Foreign key on this table for parents, link column on the target otherwise.
    pub column: &'a str,
    pub field: String,
    pub nullable: bool,
}

/// Association table of a many-to-many relationship.
pub struct AssociationView<'a> {
    pub name: &'a str,
    pub const_name: String,
    pub association: &'a Association,
}

pub struct RelationshipModule {
    pub module: String,
    pub doc: String,
    /// `(name, literal)` pairs.
    pub consts: Vec<(&'static str, String)>,
}

impl<'a> EntityView<'a> {
    pub fn new(entity: &'a Entity) -> Self {
        let columns = entity.columns();
        let fields: Vec<_> = columns
            .iter()
            .filter(|c| c.source != ColumnSource::Reserved)
            .map(Field::new)
            .collect();
        let lookups = columns
            .iter()
            .filter(|c| c.unique && c.source != ColumnSource::Reserved)
            .map(Lookup::new)
            .collect();
        let foreign_keys = columns
            .iter()
            .filter(|c| matches!(c.source, ColumnSource::ForeignKey(_)))
            .map(Field::new)
            .collect();
        let default_fns = fields.iter().filter_map(Field::default_fn).collect();

        let resolved = || entity.relationships.iter().filter(|r| r.resolved);
        let parents = resolved()
            .filter_map(|r| Some(Nav::new(r, r.foreign_key.as_deref()?, r.nullable)))
            .collect();
        let children = resolved()
            .filter(|r| r.kind == RelationshipType::OneToMany)
            .filter_map(|r| Some(Nav::new(r, r.link_column.as_deref()?, false)))
            .collect();
        let singles = resolved()
            .filter(|r| r.kind == RelationshipType::OneToOne)
            .filter_map(|r| Some(Nav::new(r, r.link_column.as_deref()?, false)))
            .collect();
        let linked = resolved()
            .filter_map(|r| Some(Nav::new(r, &r.association.as_ref()?.target_column, false)))
            .collect();

        let sql = Statements::new(entity);
        EntityView {
            entity,
            pascal: &entity.pascal,
            module: _to_var_name(&entity.snake),
            plural: &entity.plural,
            columns: columns.iter().map(Field::new).collect(),
            fields,
            lookups,
            foreign_keys,
            relationships: entity
                .relationships
                .iter()
                .map(|r| RelationshipModule::new(&sql, r))
                .collect(),
            parents,
            children,
            singles,
            linked,
            default_fns,
            sql,
        }
    }

    pub fn associations(&self) -> Vec<AssociationView<'a>> {
        self.entity
            .relationships
            .iter()
            .filter_map(|r| {
                Some(AssociationView {
                    name: &r.name,
                    const_name: r.name.to_case(Case::UpperSnake),
                    association: r.association.as_ref()?,
                })
            })
            .collect()
    }

    pub fn snake(&self) -> &str {
        &self.entity.snake
    }

    pub fn privilege(&self, action: &str) -> String {
        format!("{:?}", self.entity.privilege(action))
    }
}

impl<'a> Field<'a> {
    fn new(c: &Column<'a>) -> Self {
        let base = c.ty.rust_type();
        Field {
            name: _to_var_name(c.name),
            column: c.name,
            const_name: c.name.to_case(Case::UpperSnake),
            ty: c.rust_type(),
            update_ty: format!("Option<{}>", base),
            param_ty: if c.ty.is_borrowed() {
                "&str".to_string()
            } else {
                base.to_string()
            },
            nullable: c.nullable,
            borrowed: c.ty.is_borrowed(),
            max_length: c.ty.max_length(),
            default_expr: c.default.map(|d| {
                if c.nullable {
                    format!("Some({})", d.rust_expr())
                } else {
                    d.rust_expr()
                }
            }),
            description: c.description,
        }
    }

    pub fn doc_prefix(&self) -> String {
        _doc(self.description, "    ")
    }

    fn validate_attr(&self) -> String {
        match self.max_length {
            Some(max) => format!("    #[validate(length(max = {}))]\n", max),
            None => String::new(),
        }
    }

    pub fn create_prefix(&self) -> String {
        let mut prefix = self.doc_prefix();
        if self.default_expr.is_some() {
            prefix.push_str(&format!(
                "    #[serde(default = \"default_{}\")]\n",
                self.column
            ));
        } else if self.nullable {
            prefix.push_str("    #[serde(default)]\n");
        }
        prefix.push_str(&self.validate_attr());
        prefix
    }

    pub fn update_prefix(&self) -> String {
        let mut prefix = self.doc_prefix();
        prefix.push_str(&self.validate_attr());
        prefix
    }

    fn default_fn(&self) -> Option<String> {
        let expr = self.default_expr.as_ref()?;
        Some(format!(
            "fn default_{}() -> {} {{\n    {}\n}}",
            self.column, self.ty, expr
        ))
    }

    /// `Option` of the lookup argument taken from `input`.
    fn value(&self, input: &str, optional: bool) -> String {
        match (optional, self.borrowed) {
            (true, true) => format!("{}.{}.as_deref()", input, self.name),
            (true, false) => format!("{}.{}", input, self.name),
            (false, true) => format!("Some({}.{}.as_str())", input, self.name),
            (false, false) => format!("Some({}.{})", input, self.name),
        }
    }
}

impl<'a> Lookup<'a> {
    fn new(c: &Column<'a>) -> Self {
        let field = Field::new(c);
        Lookup {
            create_value: field.value("input", field.nullable),
            update_value: field.value("input", true),
            field,
        }
    }
}

impl<'a> Nav<'a> {
    fn new(r: &'a Relationship, column: &'a str, nullable: bool) -> Self {
        Nav {
            name: &r.name,
            target_pascal: &r.target_pascal,
            target_module: _to_var_name(&r.target_snake),
            target_privilege: format!("{:?}", format!("{}:read", r.target_snake)),
            column,
            field: _to_var_name(column),
            nullable,
        }
    }

    pub fn create_value(&self) -> String {
        if self.nullable {
            format!("input.{}", self.field)
        } else {
            format!("Some(input.{})", self.field)
        }
    }

    pub fn update_value(&self) -> String {
        format!("input.{}", self.field)
    }
}

impl RelationshipModule {
    fn new(sql: &Statements<'_>, r: &Relationship) -> Self {
        let lit = |s: &str| format!("{:?}", s);
        let mut summary = format!("    /// {} `{}`", r.kind, r.target_pascal);
        let mut consts = vec![("KIND", lit(r.kind.as_ref())), ("TARGET_TABLE", lit(&r.target_snake))];
        if let Some(bp) = &r.back_populates {
            consts.push(("BACK_POPULATES", lit(bp)));
        }
        if let Some(fk) = &r.foreign_key {
            summary.push_str(&format!(" through `{}` on this table", fk));
            consts.push(("FOREIGN_KEY", lit(fk)));
        }
        if let Some(link) = &r.link_column {
            summary.push_str(&format!(" through `{}.{}`", r.target_snake, link));
            consts.push(("LINK_COLUMN", lit(link)));
        }
        if let Some(assoc) = &r.association {
            summary.push_str(&format!(" through `{}`", assoc.table));
            consts.push(("ASSOCIATION_TABLE", lit(&assoc.table)));
            consts.push(("LOCAL_COLUMN", lit(&assoc.local_column)));
            consts.push(("TARGET_COLUMN", lit(&assoc.target_column)));
            consts.push(("CREATE_TABLE", _raw_str(&sql.create_association(r))));
        }
        summary.push_str(".\n");
        let description = _doc(r.description.as_deref(), "    ");
        if !description.is_empty() {
            summary.push_str("    ///\n");
            summary.push_str(&description);
        }
        RelationshipModule {
            module: _to_var_name(&r.name),
            doc: summary,
            consts,
        }
    }
}
