//! Macros for declaring entity metadata.
//!
//! The [`define_entity!`] macro generates the table, typed column and
//! association constants for one entity.

/// Defines a module with the constants describing one mapped table.
///
/// # Syntax
///
/// ```ignore
/// define_entity!(
///     employee {
///         table: "employee",
///         columns: {
///             ID: i64 => "id",
///             NAME: String => "name",
///             SALARY: f64 => "salary"
///         },
///         associations: {
///             DEPARTMENT: to_one "department" => "department_id",
///             PHONES: to_many "phone" => "employee_id"
///         }
///     }
/// );
/// ```
///
/// This expands to:
///
/// ```ignore
/// pub mod employee {
///     pub const TABLE: &str = "employee";
///     pub const ENTITY: qstream_criteria::EntityType = qstream_criteria::EntityType::new(TABLE);
///     pub const ID: qstream_criteria::Attr<i64> = qstream_criteria::Attr::new(TABLE, "id");
///     // ...
///     pub const DEPARTMENT: qstream_criteria::Assoc =
///         qstream_criteria::Assoc::to_one(TABLE, "DEPARTMENT", "department", "department_id");
/// }
/// ```
///
/// The `associations` section is optional. Both association forms reference
/// the `id` column of the other side.
#[macro_export]
macro_rules! define_entity {
    (
        $entity:ident {
            table: $table:literal,
            columns: {
                $($col_name:ident: $col_type:ty => $db_col:literal),* $(,)?
            }
            $(,)?
        }
    ) => {
        $crate::define_entity!(
            $entity {
                table: $table,
                columns: { $($col_name: $col_type => $db_col),* },
                associations: {}
            }
        );
    };

    (
        $entity:ident {
            table: $table:literal,
            columns: {
                $($col_name:ident: $col_type:ty => $db_col:literal),* $(,)?
            },
            associations: {
                $($assoc_name:ident: $card:ident $target:literal => $fk:literal),* $(,)?
            }
            $(,)?
        }
    ) => {
        pub mod $entity {
            #[allow(unused_imports)]
            use $crate::{Assoc, Attr, EntityType};

            pub const TABLE: &str = $table;

            pub const ENTITY: EntityType = EntityType::new(TABLE);

            $(
                pub const $col_name: Attr<$col_type> = Attr::new(TABLE, $db_col);
            )*

            $(
                pub const $assoc_name: Assoc =
                    Assoc::$card(TABLE, stringify!($assoc_name), $target, $fk);
            )*
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::Cardinality;

    crate::define_entity!(
        employee {
            table: "employee",
            columns: {
                ID: i64 => "id",
                SALARY: f64 => "salary",
            },
            associations: {
                DEPARTMENT: to_one "department" => "department_id",
                PHONES: to_many "phone" => "employee_id",
            }
        }
    );

    crate::define_entity!(
        phone {
            table: "phone",
            columns: {
                NUMBER: String => "number"
            }
        }
    );

    #[test]
    fn test_define_entity() {
        assert_eq!(employee::ENTITY.table(), "employee");
        assert_eq!(employee::SALARY.column(), "salary");
        assert_eq!(employee::SALARY.entity(), "employee");
        assert_eq!(employee::DEPARTMENT.cardinality(), Cardinality::ToOne);
        assert_eq!(employee::PHONES.target(), phone::ENTITY);
        assert_eq!(employee::PHONES.name(), "PHONES");
        assert_eq!(phone::NUMBER.column(), "number");
    }
}
