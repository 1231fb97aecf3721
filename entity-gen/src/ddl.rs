//! PostgreSQL statements embedded into the generated model and repository sources.

use crate::analyzer::{
    Association, Column, ColumnSource, Entity, Relationship, CREATED_AT, DELETED_AT, ID,
    IS_DELETED, UPDATED_AT,
};
use crate::common::sql_ident as q;

const INDENT: &str = "    ";

/// Statements of one entity's table.
#[derive(Debug, Clone, Copy)]
pub struct Statements<'a> {
    pub entity: &'a Entity,
}

impl<'a> Statements<'a> {
    pub fn new(entity: &'a Entity) -> Self {
        Statements { entity }
    }

    fn table(&self) -> String {
        q(&self.entity.snake)
    }

    pub fn create_table(&self) -> String {
        let columns: Vec<_> = self
            .entity
            .columns()
            .iter()
            .map(|c| format!("{}{}", INDENT, column_def(c)))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.table(),
            columns.join(",\n")
        )
    }

    /// Indexes of non-unique indexed properties and of foreign key columns.
    pub fn create_indexes(&self) -> Vec<String> {
        self.entity
            .columns()
            .iter()
            .filter(|c| c.indexed && !c.unique)
            .map(|c| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    q(&format!("ix_{}_{}", self.entity.snake, c.name)),
                    self.table(),
                    q(c.name)
                )
            })
            .collect()
    }

    pub fn select_by_id(&self) -> String {
        format!(
            "SELECT * FROM {} WHERE {} = $1 AND NOT {}",
            self.table(),
            q(ID),
            q(IS_DELETED)
        )
    }

    pub fn select_list(&self) -> String {
        format!(
            "SELECT * FROM {} WHERE NOT {} ORDER BY {}, {} LIMIT $1 OFFSET $2",
            self.table(),
            q(IS_DELETED),
            q(CREATED_AT),
            q(ID)
        )
    }

    /// Lookup through a unique column.
    pub fn select_by(&self, column: &str) -> String {
        format!(
            "SELECT * FROM {} WHERE {} = $1 AND NOT {}",
            self.table(),
            q(column),
            q(IS_DELETED)
        )
    }

    /// Page of rows sharing a foreign key value.
    pub fn select_list_by(&self, column: &str) -> String {
        format!(
            "SELECT * FROM {} WHERE {} = $1 AND NOT {} ORDER BY {}, {} LIMIT $2 OFFSET $3",
            self.table(),
            q(column),
            q(IS_DELETED),
            q(CREATED_AT),
            q(ID)
        )
    }

    /// `$1` is the new id, then one parameter per input column.
    pub fn insert(&self) -> String {
        let inputs = self.entity.input_columns();
        let mut names = vec![q(ID)];
        names.extend(inputs.iter().map(|c| q(c.name)));
        let params: Vec<_> = (1..=names.len()).map(|i| format!("${}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            self.table(),
            names.join(", "),
            params.join(", ")
        )
    }

    /// `$1` is the id, then one optional parameter per input column; `NULL` keeps the value.
    pub fn update(&self) -> String {
        let mut sets: Vec<_> = self
            .entity
            .input_columns()
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{0} = COALESCE(${1}, {0})", q(c.name), i + 2))
            .collect();
        sets.push(format!("{} = NOW()", q(UPDATED_AT)));
        format!(
            "UPDATE {} SET {} WHERE {} = $1 AND NOT {} RETURNING *",
            self.table(),
            sets.join(", "),
            q(ID),
            q(IS_DELETED)
        )
    }

    pub fn soft_delete(&self) -> String {
        format!(
            "UPDATE {} SET {} = TRUE, {} = NOW(), {} = NOW() WHERE {} = $1 AND NOT {} RETURNING *",
            self.table(),
            q(IS_DELETED),
            q(DELETED_AT),
            q(UPDATED_AT),
            q(ID),
            q(IS_DELETED)
        )
    }

    pub fn hard_delete(&self) -> String {
        format!("DELETE FROM {} WHERE {} = $1 RETURNING *", self.table(), q(ID))
    }

    /// Join table of a many-to-many relationship. Both sides of a pair render the same text.
    pub fn create_association(&self, rel: &Relationship) -> String {
        let Some(assoc) = &rel.association else {
            return String::new();
        };
        let mut columns = [
            (assoc.local_column.as_str(), self.entity.snake.as_str()),
            (assoc.target_column.as_str(), rel.target_snake.as_str()),
        ];
        columns.sort();
        let defs: Vec<_> = columns
            .iter()
            .map(|(column, table)| {
                format!(
                    "{}{} UUID NOT NULL REFERENCES {} ({}) ON DELETE CASCADE",
                    INDENT,
                    q(column),
                    q(table),
                    q(ID)
                )
            })
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{},\n{}PRIMARY KEY ({}, {})\n)",
            q(&assoc.table),
            defs.join(",\n"),
            INDENT,
            q(columns[0].0),
            q(columns[1].0)
        )
    }

    pub fn link(&self, assoc: &Association) -> String {
        format!(
            "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            q(&assoc.table),
            q(&assoc.local_column),
            q(&assoc.target_column)
        )
    }

    pub fn unlink(&self, assoc: &Association) -> String {
        format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            q(&assoc.table),
            q(&assoc.local_column),
            q(&assoc.target_column)
        )
    }

    pub fn linked_ids(&self, assoc: &Association) -> String {
        format!(
            "SELECT {0} FROM {1} WHERE {2} = $1 ORDER BY {0}",
            q(&assoc.target_column),
            q(&assoc.table),
            q(&assoc.local_column)
        )
    }
}

fn column_def(c: &Column<'_>) -> String {
    let mut def = format!("{} {}", q(c.name), c.ty.sql_type());
    if c.name == ID {
        def.push_str(" PRIMARY KEY");
        return def;
    }
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(&default.sql_literal());
    } else if c.name == CREATED_AT || c.name == UPDATED_AT {
        def.push_str(" DEFAULT NOW()");
    } else if c.name == IS_DELETED {
        def.push_str(" DEFAULT FALSE");
    }
    if c.unique {
        def.push_str(" UNIQUE");
    }
    if let ColumnSource::ForeignKey(rel) = &c.source {
        def.push_str(&format!(
            " REFERENCES {} ({}) ON DELETE {}",
            q(&rel.target_snake),
            q(ID),
            if c.nullable { "SET NULL" } else { "CASCADE" }
        ));
    }
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::schema::parse_str;
    use crate::GeneratorConfig;

    fn entities(json: &str) -> Vec<Entity> {
        analyze(&parse_str(json).unwrap(), &GeneratorConfig::default())
            .unwrap()
            .entities
    }

    #[test]
    fn create_table() {
        let entities = entities(
            r#"[
            {"name": "Project", "properties": [
                {"name": "title", "type": "string", "is_unique": true},
                {"name": "budget", "type": "float", "is_nullable": true, "is_indexed": true},
                {"name": "is_active", "type": "boolean", "default_value": true}
            ]},
            {"name": "Task", "relationships": [
                {"name": "project", "type": "many-to-one", "target_entity": "Project", "is_nullable": false}
            ]}
        ]"#,
        );
        let project = Statements::new(&entities[0]);
        assert_eq!(
            project.create_table(),
            r#"CREATE TABLE IF NOT EXISTS "project" (
    "id" UUID PRIMARY KEY,
    "title" VARCHAR(255) NOT NULL UNIQUE,
    "budget" DOUBLE PRECISION,
    "is_active" BOOLEAN NOT NULL DEFAULT TRUE,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    "deleted_at" TIMESTAMPTZ,
    "is_deleted" BOOLEAN NOT NULL DEFAULT FALSE
)"#
        );
        assert_eq!(
            project.create_indexes(),
            [r#"CREATE INDEX IF NOT EXISTS "ix_project_budget" ON "project" ("budget")"#]
        );

        let task = Statements::new(&entities[1]);
        assert!(task.create_table().contains(
            r#""project_id" UUID NOT NULL REFERENCES "project" ("id") ON DELETE CASCADE"#
        ));
        assert_eq!(
            task.create_indexes(),
            [r#"CREATE INDEX IF NOT EXISTS "ix_task_project_id" ON "task" ("project_id")"#]
        );
    }

    #[test]
    fn dml_parameters() {
        let entities = entities(
            r#"[{"name": "Task", "properties": [
                {"name": "summary", "type": "string"},
                {"name": "done", "type": "boolean"}
            ]}]"#,
        );
        let task = Statements::new(&entities[0]);
        assert_eq!(
            task.insert(),
            r#"INSERT INTO "task" ("id", "summary", "done") VALUES ($1, $2, $3) RETURNING *"#
        );
        assert_eq!(
            task.update(),
            r#"UPDATE "task" SET "summary" = COALESCE($2, "summary"), "done" = COALESCE($3, "done"), "updated_at" = NOW() WHERE "id" = $1 AND NOT "is_deleted" RETURNING *"#
        );
        assert_eq!(
            task.select_list(),
            r#"SELECT * FROM "task" WHERE NOT "is_deleted" ORDER BY "created_at", "id" LIMIT $1 OFFSET $2"#
        );
    }

    #[test]
    fn association_is_identical_from_both_sides() {
        let entities = entities(
            r#"[
            {"name": "Tag", "relationships": [{"name": "tasks", "type": "many-to-many", "target_entity": "Task", "back_populates": "tags"}]},
            {"name": "Task", "relationships": [{"name": "tags", "type": "many-to-many", "target_entity": "Tag", "back_populates": "tasks"}]}
        ]"#,
        );
        let tag = Statements::new(&entities[0]).create_association(&entities[0].relationships[0]);
        let task = Statements::new(&entities[1]).create_association(&entities[1].relationships[0]);
        assert_eq!(tag, task);
        assert_eq!(
            tag,
            r#"CREATE TABLE IF NOT EXISTS "tag_task_association" (
    "tag_id" UUID NOT NULL REFERENCES "tag" ("id") ON DELETE CASCADE,
    "task_id" UUID NOT NULL REFERENCES "task" ("id") ON DELETE CASCADE,
    PRIMARY KEY ("tag_id", "task_id")
)"#
        );
        let assoc = entities[1].relationships[0].association.as_ref().unwrap();
        assert_eq!(
            Statements::new(&entities[1]).linked_ids(assoc),
            r#"SELECT "tag_id" FROM "tag_task_association" WHERE "task_id" = $1 ORDER BY "tag_id""#
        );
    }

    #[test]
    fn self_referencing_pair_links_in_opposite_directions() {
        let entities = entities(
            r#"[{"name": "User", "relationships": [
                {"name": "followers", "type": "many-to-many", "target_entity": "User", "back_populates": "following"},
                {"name": "following", "type": "many-to-many", "target_entity": "User", "back_populates": "followers"}
            ]}]"#,
        );
        let user = Statements::new(&entities[0]);
        let followers = &entities[0].relationships[0];
        let following = &entities[0].relationships[1];
        assert_eq!(user.create_association(followers), user.create_association(following));
        let followers = followers.association.as_ref().unwrap();
        let following = following.association.as_ref().unwrap();
        assert_ne!(user.link(followers), user.link(following));
        assert_eq!(
            user.link(following),
            r#"INSERT INTO "user_user_association" ("related_user_id", "user_id") VALUES ($1, $2) ON CONFLICT DO NOTHING"#
        );
        assert_eq!(
            user.linked_ids(followers),
            r#"SELECT "related_user_id" FROM "user_user_association" WHERE "user_id" = $1 ORDER BY "related_user_id""#
        );
    }
}
