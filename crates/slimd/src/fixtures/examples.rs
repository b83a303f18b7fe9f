//! Example fixtures for decision, script and query tables.

use std::sync::Arc;

use slim_fixtures::{
    ConversionOverrides, FixtureCatalog, FixtureClass, FixtureError, Value, ValueType,
    YesNoConverter,
};
use time::Date;
use time::macros::date;

use super::EXAMPLES_PACKAGE;

pub(super) fn register(catalog: &FixtureCatalog) {
    for class in [
        should_i_buy_milk(),
        login_dialog_driver(),
        employees_hired_before(),
        yes_no_flag(),
        stop_test_fixture(),
    ] {
        catalog.register_class(EXAMPLES_PACKAGE, class);
    }
}

// ---------------------------------------------------------------------------
// Decision table
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ShouldIBuyMilk {
    cash: i64,
    pints: i64,
    credit_card: bool,
}

impl ShouldIBuyMilk {
    const fn go_to_store(&self) -> &'static str {
        if self.pints == 0 && (self.cash > 2 || self.credit_card) {
            "yes"
        } else {
            "no"
        }
    }
}

fn should_i_buy_milk() -> FixtureClass {
    FixtureClass::builder::<ShouldIBuyMilk>("ShouldIBuyMilk")
        .default_constructor()
        .method("setCashInWallet", [ValueType::Int], |milk, args| {
            milk.cash = args.int(0)?;
            Ok(())
        })
        .method("setCreditCard", [ValueType::Bool], |milk, args| {
            milk.credit_card = args.bool(0)?;
            Ok(())
        })
        .method("setPintsOfMilkRemaining", [ValueType::Int], |milk, args| {
            milk.pints = args.int(0)?;
            Ok(())
        })
        .method("goToStore", [], |milk, _| Ok(milk.go_to_store()))
        .build()
}

// ---------------------------------------------------------------------------
// Script table
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct LoginDialogDriver {
    user_name: String,
    password: String,
    message: String,
    attempts: i64,
}

impl LoginDialogDriver {
    fn login(&mut self, user_name: &str, password: &str) -> bool {
        self.attempts += 1;
        let accepted = user_name == self.user_name && password == self.password;
        self.message = if accepted {
            format!("{user_name} logged in.")
        } else {
            format!("{user_name} not logged in.")
        };
        accepted
    }
}

fn login_dialog_driver() -> FixtureClass {
    FixtureClass::builder::<LoginDialogDriver>("LoginDialogDriver")
        .constructor([ValueType::Str, ValueType::Str], |args| {
            Ok(LoginDialogDriver {
                user_name: args.str(0)?.to_owned(),
                password: args.str(1)?.to_owned(),
                message: String::new(),
                attempts: 0,
            })
        })
        .method(
            "loginWithUsernameAndPassword",
            [ValueType::Str, ValueType::Str],
            |driver, args| Ok(driver.login(args.str(0)?, args.str(1)?)),
        )
        .method("loginMessage", [], |driver, _| Ok(driver.message.clone()))
        .method("numberOfLoginAttempts", [], |driver, _| Ok(driver.attempts))
        .build()
}

// ---------------------------------------------------------------------------
// Query table
// ---------------------------------------------------------------------------

struct Employee {
    number: i64,
    first_name: &'static str,
    last_name: &'static str,
    hired: Date,
}

const EMPLOYEES: [Employee; 3] = [
    Employee {
        number: 1429,
        first_name: "Bob",
        last_name: "Martin",
        hired: date!(1974 - 10 - 10),
    },
    Employee {
        number: 8832,
        first_name: "James",
        last_name: "Grenning",
        hired: date!(1979 - 12 - 15),
    },
    Employee {
        number: 2241,
        first_name: "Micah",
        last_name: "Martin",
        hired: date!(1999 - 01 - 28),
    },
];

#[derive(Debug)]
struct EmployeesHiredBefore {
    cutoff: Date,
}

impl EmployeesHiredBefore {
    /// One row per matching employee, each row a list of `[column, value]`
    /// pairs.
    fn query(&self) -> Value {
        EMPLOYEES
            .iter()
            .filter(|employee| employee.hired < self.cutoff)
            .map(|employee| {
                Value::List(vec![
                    cell("employee number", Value::Int(employee.number)),
                    cell("first name", Value::from(employee.first_name)),
                    cell("last name", Value::from(employee.last_name)),
                    cell("hire date", Value::Date(employee.hired)),
                ])
            })
            .collect::<Vec<_>>()
            .into()
    }
}

fn cell(column: &str, value: Value) -> Value {
    Value::List(vec![Value::from(column), value])
}

fn employees_hired_before() -> FixtureClass {
    FixtureClass::builder::<EmployeesHiredBefore>("EmployeesHiredBefore")
        .constructor([ValueType::Date], |args| {
            Ok(EmployeesHiredBefore {
                cutoff: args.date(0)?,
            })
        })
        .method("query", [], |query, _| Ok(query.query()))
        .build()
}

// ---------------------------------------------------------------------------
// Conversion overrides and test control
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct YesNoFlag {
    flag: bool,
}

/// Speaks `yes`/`no` through a per-method override while `flagAsBoolean`
/// keeps the registry's `true`/`false`.
fn yes_no_flag() -> FixtureClass {
    let yes_no = ConversionOverrides::new().with(ValueType::Bool, Arc::new(YesNoConverter));
    FixtureClass::builder::<YesNoFlag>("YesNoFlag")
        .default_constructor()
        .method_with_overrides(
            "setFlag",
            [ValueType::Bool],
            yes_no.clone(),
            |state, args| {
                state.flag = args.bool(0)?;
                Ok(())
            },
        )
        .method_with_overrides("flag", [], yes_no, |state, _| Ok(state.flag))
        .method("flagAsBoolean", [], |state, _| Ok(state.flag))
        .build()
}

#[derive(Debug, Default)]
struct StopTestFixture;

fn stop_test_fixture() -> FixtureClass {
    FixtureClass::builder::<StopTestFixture>("StopTestFixture")
        .default_constructor()
        .method("stopTest", [ValueType::Str], |_, args| {
            Err::<(), _>(FixtureError::stop_test(args.str(0)?))
        })
        .method("fail", [ValueType::Str], |_, args| {
            Err::<(), _>(FixtureError::new(args.str(0)?))
        })
        .build()
}
