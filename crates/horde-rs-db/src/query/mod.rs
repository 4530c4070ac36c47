//! Query building and SQL compilation.
//!
//! - [`builder`] - The fluent [`Model`] builder
//! - [`plan`] - [`QueryPlan`], filters, and join steps
//! - [`compiler`] - [`SqlCompiler`], which renders plans and mutations

pub mod builder;
pub mod compiler;
pub mod plan;

pub use builder::Model;
pub use compiler::SqlCompiler;
pub use plan::{Connective, FilterClause, JoinStep, Op, QueryMode, QueryPlan, Where};

#[cfg(test)]
mod tests {
    use horde_rs_core::{Dialect, HordeError};

    use super::*;
    use crate::testing::{Customer, Gadget, SavingsAccount};
    use crate::value::Value;

    const CUSTOMER_COLS: &str = "Customer.CustomerID AS CustomerCustomerID, \
         Customer.LastName AS CustomerLastName, \
         Customer.FirstName AS CustomerFirstName";
    const CUSTOMER_ORDER: &str = "Customer.CustomerID, Customer.LastName, Customer.FirstName";
    const ACCOUNT_COLS: &str = "SavingsAccount.AccountNumber AS SavingsAccountAccountNumber, \
         SavingsAccount.FKCustomerIDAccount AS SavingsAccountFKCustomerIDAccount, \
         SavingsAccount.Balance AS SavingsAccountBalance";
    const ACCOUNT_ORDER: &str =
        "SavingsAccount.AccountNumber, SavingsAccount.FKCustomerIDAccount, SavingsAccount.Balance";

    #[test]
    fn test_find_all_selects_every_field() {
        let (sql, bindings) = Model::<Customer>::new()
            .find_all()
            .build(Dialect::SqlServer)
            .unwrap();
        assert_eq!(
            sql,
            format!("SELECT {CUSTOMER_COLS} FROM Customer ORDER BY {CUSTOMER_ORDER}")
        );
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_column_aliases_are_unique_per_field() {
        let model = Model::<SavingsAccount>::new().find_one();
        let plan = model.plan().unwrap();
        assert_eq!(plan.mode(), QueryMode::One);
        let cols = plan.columns();
        assert_eq!(cols.len(), 3);
        let aliases: std::collections::HashSet<_> = plan
            .base()
            .columns()
            .iter()
            .map(|c| c.alias.clone())
            .collect();
        assert_eq!(aliases.len(), 3);
        assert!(aliases.contains("SavingsAccountFKCustomerIDAccount"));
        assert_eq!(plan.order_by().len(), cols.len());
    }

    #[test]
    fn test_where_and_or_composition() {
        let (sql, bindings) = Model::<Customer>::new()
            .find_all()
            .filter(Where::eq("LastName", "Smith"))
            .filter(Where::ne("FirstName", "Ann"))
            .and_filter(Where::like("FirstName", "J%"))
            .or_filter(Where::eq("CustomerID", "026-0000002"))
            .build(Dialect::SqlServer)
            .unwrap();
        assert!(sql.ends_with(&format!(
            "FROM Customer WHERE Customer.LastName = @CustomerLastName \
             AND Customer.FirstName <> @CustomerFirstName \
             AND Customer.FirstName LIKE @CustomerFirstName_2 \
             OR Customer.CustomerID = @CustomerCustomerID \
             ORDER BY {CUSTOMER_ORDER}"
        )));
        let names: Vec<_> = bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "CustomerLastName",
                "CustomerFirstName",
                "CustomerFirstName_2",
                "CustomerCustomerID"
            ]
        );
        assert_eq!(
            bindings.get("CustomerFirstName_2"),
            Some(&Value::String("J%".into()))
        );
    }

    #[test]
    fn test_and_or_before_where_is_invalid() {
        for model in [
            Model::<Customer>::new()
                .find_all()
                .and_filter(Where::eq("LastName", "Smith")),
            Model::<Customer>::new()
                .find_all()
                .or_filter(Where::eq("LastName", "Smith")),
        ] {
            assert!(matches!(
                model.build(Dialect::SqlServer),
                Err(HordeError::InvalidQueryState(_))
            ));
        }
    }

    #[test]
    fn test_filter_before_find_is_invalid() {
        let model = Model::<Customer>::new().filter(Where::eq("LastName", "Smith"));
        assert!(matches!(model.plan(), Err(HordeError::InvalidQueryState(_))));
    }

    #[test]
    fn test_first_error_wins() {
        let model = Model::<Customer>::new()
            .find_all()
            .join("Loans", [])
            .and_filter(Where::eq("LastName", "Smith"))
            .join("SavingsAccounts", []);
        match model.build(Dialect::SqlServer) {
            Err(HordeError::UnknownRelationship { record, name }) => {
                assert_eq!(record, "Customer");
                assert_eq!(name, "Loans");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_find_twice_is_invalid() {
        let model = Model::<Customer>::new().find_all().find_one();
        assert!(matches!(model.plan(), Err(HordeError::InvalidQueryState(_))));
    }

    #[test]
    fn test_join_with_extra_filters() {
        let (sql, bindings) = Model::<Customer>::new()
            .find_one()
            .join("SavingsAccounts", [Where::gt("Balance", 100.0)])
            .filter(Where::eq("CustomerID", "026-0000002"))
            .build(Dialect::SqlServer)
            .unwrap();
        assert_eq!(
            sql,
            format!(
                "SELECT {CUSTOMER_COLS}, {ACCOUNT_COLS} FROM Customer \
                 INNER JOIN SavingsAccount ON Customer.CustomerID = SavingsAccount.FKCustomerIDAccount \
                 WHERE SavingsAccount.Balance > @SavingsAccountBalance \
                 AND Customer.CustomerID = @CustomerCustomerID \
                 ORDER BY {CUSTOMER_ORDER}, {ACCOUNT_ORDER}"
            )
        );
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn test_multi_hop_join_emits_terminal_only() {
        let model = Model::<Customer>::new()
            .find_all()
            .join("SavingsAccounts", [])
            .join("SavingsAccounts.Transactions", []);
        let plan = model.plan().unwrap();
        assert_eq!(plan.joins().len(), 2);
        let step = &plan.joins()[1];
        assert_eq!(step.depth(), 2);
        assert_eq!(step.prefix().as_deref(), Some("SavingsAccounts"));
        assert_eq!(
            step.clause(),
            "INNER JOIN AccountTransaction ON SavingsAccount.AccountNumber = AccountTransaction.FKAccountNumber"
        );
        assert_eq!(plan.columns().len(), 9);

        let (sql, _) = model.build(Dialect::Sqlite).unwrap();
        assert_eq!(sql.matches("INNER JOIN").count(), 2);
        assert_eq!(sql.matches("INNER JOIN AccountTransaction").count(), 1);
    }

    #[test]
    fn test_multi_hop_join_requires_prefix() {
        let model = Model::<Customer>::new()
            .find_all()
            .join("SavingsAccounts.Transactions", []);
        assert!(matches!(model.plan(), Err(HordeError::InvalidQueryState(_))));
    }

    #[test]
    fn test_join_same_path_twice() {
        let model = Model::<Customer>::new()
            .find_all()
            .join("SavingsAccounts", [])
            .join("SavingsAccounts", []);
        assert!(matches!(model.plan(), Err(HordeError::InvalidQueryState(_))));
    }

    #[test]
    fn test_join_back_to_base_table_is_invalid() {
        let model = Model::<Customer>::new()
            .find_all()
            .join("SavingsAccounts", [])
            .join("SavingsAccounts.Owner", []);
        assert!(matches!(model.plan(), Err(HordeError::InvalidQueryState(_))));
    }

    #[test]
    fn test_join_empty_segment() {
        for path in ["", "SavingsAccounts.", ".SavingsAccounts"] {
            let model = Model::<Customer>::new().find_all().join(path, []);
            assert!(
                matches!(model.plan(), Err(HordeError::UnknownRelationship { .. })),
                "{path}"
            );
        }
    }

    #[test]
    fn test_join_unsupported_field_type() {
        let model = Model::<Customer>::new().find_all().join("Gadgets", []);
        assert!(matches!(
            model.plan(),
            Err(HordeError::UnsupportedFieldType { .. })
        ));
        let model = Model::<Gadget>::new().find_all();
        assert!(matches!(
            model.plan(),
            Err(HordeError::UnsupportedFieldType { .. })
        ));
    }

    #[test]
    fn test_sqlite_placeholders() {
        let (sql, _) = Model::<Customer>::new()
            .find_all()
            .filter(Where::eq("LastName", "Smith"))
            .build(Dialect::Sqlite)
            .unwrap();
        assert!(sql.contains("WHERE Customer.LastName = :CustomerLastName ORDER BY"));
    }

    #[test]
    fn test_compile_insert() {
        let compiler = SqlCompiler::new(Dialect::SqlServer);
        let fields = vec![
            ("LastName".to_string(), Value::from("Smith")),
            ("FirstName".to_string(), Value::from("Jane")),
        ];
        let (sql, bindings) = compiler.compile_insert("Customer", &fields, true).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO Customer (LastName, FirstName) VALUES (@LastName, @FirstName); \
             SELECT ID = CONVERT(BIGINT, SCOPE_IDENTITY());"
        );
        assert_eq!(bindings.get("FirstName"), Some(&Value::from("Jane")));

        let (sql, _) = SqlCompiler::new(Dialect::Sqlite)
            .compile_insert("Customer", &fields, true)
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO Customer (LastName, FirstName) VALUES (:LastName, :FirstName) RETURNING rowid AS ID"
        );

        let (sql, _) = compiler.compile_insert("Customer", &fields, false).unwrap();
        assert!(!sql.contains("SCOPE_IDENTITY"));
    }

    #[test]
    fn test_compile_update() {
        let model = Model::<Customer>::new()
            .find_one()
            .filter(Where::eq("LastName", "Smith"));
        let fields = vec![("LastName".to_string(), Value::from("Jones"))];
        let (sql, bindings) = SqlCompiler::new(Dialect::SqlServer)
            .compile_update(model.plan().unwrap(), &fields)
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE Customer SET LastName = @valLastName WHERE Customer.LastName = @CustomerLastName"
        );
        let names: Vec<_> = bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["CustomerLastName", "valLastName"]);
    }

    #[test]
    fn test_compile_update_rejects_missing_filter_and_joins() {
        let compiler = SqlCompiler::new(Dialect::SqlServer);
        let fields = vec![("LastName".to_string(), Value::from("Jones"))];

        let unfiltered = Model::<Customer>::new().find_all();
        assert!(matches!(
            compiler.compile_update(unfiltered.plan().unwrap(), &fields),
            Err(HordeError::InvalidQueryState(_))
        ));

        let joined = Model::<Customer>::new()
            .find_all()
            .join("SavingsAccounts", [])
            .filter(Where::eq("LastName", "Smith"));
        assert!(matches!(
            compiler.compile_update(joined.plan().unwrap(), &fields),
            Err(HordeError::InvalidQueryState(_))
        ));

        let filtered = Model::<Customer>::new()
            .find_all()
            .filter(Where::eq("LastName", "Smith"));
        assert!(matches!(
            compiler.compile_update(filtered.plan().unwrap(), &[]),
            Err(HordeError::InvalidQueryState(_))
        ));
    }
}
