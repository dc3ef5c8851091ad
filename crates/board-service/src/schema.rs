//! 实体注册表
//!
//! 静态声明所有实体及其外键关系，启动时用于校验数据库结构。
//! 权威的建表语句位于 `migrations/0001_board_schema.sql`。

/// 外键删除行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    Restrict,
}

/// 外键声明
#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: &'static str,
    pub on_delete: OnDelete,
}

/// 实体声明
#[derive(Debug, Clone, Copy)]
pub struct EntityDef {
    pub table: &'static str,
    pub foreign_keys: &'static [ForeignKey],
}

/// 全部实体，顺序即依赖顺序（被引用的表在前）
pub static ENTITY_REGISTRY: &[EntityDef] = &[
    EntityDef {
        table: "groups",
        foreign_keys: &[],
    },
    EntityDef {
        table: "posts",
        foreign_keys: &[ForeignKey {
            column: "group_id",
            references: "groups",
            on_delete: OnDelete::Cascade,
        }],
    },
    EntityDef {
        table: "comments",
        foreign_keys: &[ForeignKey {
            column: "post_id",
            references: "posts",
            on_delete: OnDelete::Cascade,
        }],
    },
    EntityDef {
        table: "tags",
        foreign_keys: &[],
    },
    EntityDef {
        table: "post_tags",
        foreign_keys: &[
            ForeignKey {
                column: "post_id",
                references: "posts",
                on_delete: OnDelete::Cascade,
            },
            ForeignKey {
                column: "tag_id",
                references: "tags",
                on_delete: OnDelete::Cascade,
            },
        ],
    },
    EntityDef {
        table: "badges",
        foreign_keys: &[],
    },
    EntityDef {
        table: "group_badges",
        foreign_keys: &[
            ForeignKey {
                column: "group_id",
                references: "groups",
                on_delete: OnDelete::Cascade,
            },
            ForeignKey {
                column: "badge_id",
                references: "badges",
                on_delete: OnDelete::Restrict,
            },
        ],
    },
];

/// 所有表名
pub fn table_names() -> impl Iterator<Item = &'static str> {
    ENTITY_REGISTRY.iter().map(|e| e.table)
}

/// 删除 `table` 中的行时会被级联删除的表（递归展开）
pub fn cascade_targets(table: &str) -> Vec<&'static str> {
    let mut result: Vec<&'static str> = Vec::new();
    let mut frontier = vec![table.to_string()];

    while let Some(current) = frontier.pop() {
        for entity in ENTITY_REGISTRY {
            let cascades = entity
                .foreign_keys
                .iter()
                .any(|fk| fk.references == current && fk.on_delete == OnDelete::Cascade);
            if cascades && !result.contains(&entity.table) {
                result.push(entity.table);
                frontier.push(entity.table.to_string());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_keys_reference_earlier_entities() {
        for (idx, entity) in ENTITY_REGISTRY.iter().enumerate() {
            for fk in entity.foreign_keys {
                let target = ENTITY_REGISTRY
                    .iter()
                    .position(|e| e.table == fk.references)
                    .unwrap_or_else(|| panic!("{} 引用了未声明的表 {}", entity.table, fk.references));
                assert!(target < idx, "{} 必须声明在 {} 之后", entity.table, fk.references);
            }
        }
    }

    #[test]
    fn test_table_names_are_unique() {
        let mut names: Vec<_> = table_names().collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_group_delete_cascades_to_dependents() {
        let targets = cascade_targets("groups");
        for table in ["posts", "comments", "post_tags", "group_badges"] {
            assert!(targets.contains(&table), "groups 删除应级联到 {}", table);
        }
        assert!(!targets.contains(&"badges"));
        assert!(!targets.contains(&"tags"));
    }

    #[test]
    fn test_badge_catalog_is_not_cascaded() {
        assert!(cascade_targets("badges").is_empty());
    }

    #[test]
    fn test_schema_file_declares_every_table() {
        let sql = include_str!("../migrations/0001_board_schema.sql");
        for table in table_names() {
            assert!(
                sql.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "schema 文件缺少表 {}",
                table
            );
        }
    }
}
