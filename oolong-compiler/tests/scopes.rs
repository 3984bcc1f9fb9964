use oolong_compiler::{
    CheckedVariable, Project, Scope, Span, BOOL_TYPE_ID, INT_TYPE_ID, STRING_TYPE_ID,
};

fn var(name: &str, type_id: usize) -> CheckedVariable {
    CheckedVariable {
        name: name.to_string(),
        type_id,
    }
}

#[test]
fn inner_declarations_shadow_outer_ones() {
    let mut project = Project::new();
    let outer = project.create_scope(0);
    let inner = project.create_scope(outer);

    project
        .add_var_to_scope(outer, var("x", INT_TYPE_ID), Span::default())
        .unwrap();
    project
        .add_var_to_scope(inner, var("x", STRING_TYPE_ID), Span::default())
        .unwrap();

    assert_eq!(
        project.find_var_in_scope(inner, "x").unwrap().type_id,
        STRING_TYPE_ID
    );
    assert_eq!(
        project.find_var_in_scope(outer, "x").unwrap().type_id,
        INT_TYPE_ID
    );
}

#[test]
fn lookup_walks_to_the_root() {
    let mut project = Project::new();
    let outer = project.create_scope(0);
    let middle = project.create_scope(outer);
    let inner = project.create_scope(middle);

    project
        .add_var_to_scope(outer, var("depth", BOOL_TYPE_ID), Span::default())
        .unwrap();

    assert_eq!(
        project.find_var_in_scope(inner, "depth").unwrap().type_id,
        BOOL_TYPE_ID
    );
    assert!(project.find_var_in_scope(inner, "missing").is_none());
}

#[test]
fn rejects_redefinition_in_the_same_scope() {
    let mut project = Project::new();
    let scope = project.create_scope(0);

    project
        .add_var_to_scope(scope, var("x", INT_TYPE_ID), Span::default())
        .unwrap();
    let error = project
        .add_var_to_scope(scope, var("x", INT_TYPE_ID), Span::default())
        .unwrap_err();
    assert_eq!(error.message, "redefinition of variable x");
}

#[test]
fn allows_redefinition_in_a_child_scope() {
    let mut project = Project::new();
    let outer = project.create_scope(0);
    let inner = project.create_scope(outer);

    project
        .add_var_to_scope(outer, var("x", INT_TYPE_ID), Span::default())
        .unwrap();
    assert!(project
        .add_var_to_scope(inner, var("x", INT_TYPE_ID), Span::default())
        .is_ok());
}

#[test]
fn rejects_type_function_and_record_redefinitions() {
    let mut project = Project::new();
    let scope = project.create_scope(0);

    project
        .add_type_to_scope(scope, "T".to_string(), INT_TYPE_ID, Span::default())
        .unwrap();
    assert!(project
        .add_type_to_scope(scope, "T".to_string(), INT_TYPE_ID, Span::default())
        .is_err());

    project
        .add_function_to_scope(scope, "f".to_string(), 0, Span::default())
        .unwrap();
    assert!(project
        .add_function_to_scope(scope, "f".to_string(), 0, Span::default())
        .is_err());

    project
        .add_record_to_scope(scope, "R".to_string(), 0, Span::default())
        .unwrap();
    assert!(project
        .add_record_to_scope(scope, "R".to_string(), 0, Span::default())
        .is_err());
}

#[test]
fn scope_children_are_linked_to_their_parent() {
    let mut project = Project::new();
    let outer = project.create_scope(0);
    let inner = project.create_scope(outer);

    assert!(project.scopes[0].children.contains(&outer));
    assert!(project.scopes[outer].children.contains(&inner));
    assert_eq!(project.scopes[inner].parent, Some(outer));
}

#[test]
fn can_access_follows_the_ancestor_chain() {
    let mut project = Project::new();
    let outer = project.create_scope(0);
    let inner = project.create_scope(outer);
    let sibling = project.create_scope(0);

    assert!(Scope::can_access(inner, inner, &project));
    assert!(Scope::can_access(inner, outer, &project));
    assert!(Scope::can_access(inner, 0, &project));
    assert!(!Scope::can_access(outer, inner, &project));
    assert!(!Scope::can_access(sibling, inner, &project));
}

#[test]
fn root_scope_carries_the_builtins() {
    let project = Project::new();
    assert_eq!(project.find_type_in_scope(0, "int"), Some(INT_TYPE_ID));
    assert_eq!(project.find_type_in_scope(0, "bool"), Some(BOOL_TYPE_ID));
    assert!(project.find_record_in_scope(0, "Array").is_some());
    assert!(project.find_record_in_scope(0, "Optional").is_some());
    assert!(project.find_record_in_scope(0, "WeakPtr").is_some());
}
