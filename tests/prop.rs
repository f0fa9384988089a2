use eqsat::*;

define_atom! {
    /// A named propositional variable.
    pub struct Var(pub Symbol);
}

define_atom! {
    /// A boolean constant.
    pub struct Bool(pub bool);
}

define_field! {
    pub struct Negated;
    pub struct Left;
    pub struct Right;
    pub struct Antecedent;
    pub struct Consequent;
}

define_node! { pub struct Not(Negated); }
define_node! { pub struct And(Left, Right); }
define_node! { pub struct Or(Left, Right); }
define_node! { pub struct Implies(Antecedent, Consequent); }

define_language! {
    pub enum Prop {
        Var(Var),
        Bool(Bool),
        Not(Not),
        And(And),
        Or(Or),
        Implies(Implies),
    }
}

type EGraph = eqsat::EGraph<Prop, ConstantFold>;

/// Constant folding: each class's data is the boolean value every term
/// in the class evaluates to, if it is known.
#[derive(Debug, Default)]
struct ConstantFold;

impl Analysis<Prop> for ConstantFold {
    type Data = Option<bool>;

    fn make(egraph: &EGraph, enode: &Prop) -> Self::Data {
        let eval = |id: Id| egraph[id].data;
        match enode {
            Prop::Var(_) => None,
            Prop::Bool(b) => Some(*b.value()),
            Prop::Not(n) => Some(!eval(n.field::<Negated>())?),
            Prop::And(a) => Some(eval(a.field::<Left>())? && eval(a.field::<Right>())?),
            Prop::Or(o) => Some(eval(o.field::<Left>())? || eval(o.field::<Right>())?),
            Prop::Implies(i) => {
                Some(!eval(i.field::<Antecedent>())? || eval(i.field::<Consequent>())?)
            }
        }
    }

    fn join(&mut self, to: &mut Self::Data, from: Self::Data) -> bool {
        join_if_different(to, to.or(from))
    }
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn var(egraph: &mut EGraph, name: &str) -> Id {
    egraph.add(Var(Symbol::from(name)).into())
}

#[test]
fn hashconsing_atoms() {
    init();
    let mut egraph = EGraph::default();

    let id1 = egraph.add(Bool(true).into());
    let id2 = egraph.add(Bool(true).into());
    let id3 = egraph.add(Bool(false).into());

    assert_eq!(id1, id2);
    assert_ne!(id2, id3);
}

#[test]
fn atom_data() {
    init();
    let mut egraph = EGraph::default();

    let id1 = egraph.add(Bool(true).into());
    let id2 = egraph.add(Bool(false).into());
    let x = var(&mut egraph, "x");

    assert_eq!(egraph[id1].data, Some(true));
    assert_eq!(egraph[id2].data, Some(false));
    assert_eq!(egraph[x].data, None);
}

#[test]
fn const_fold_and() {
    init();
    for (left, right, expected) in [
        (true, true, true),
        (true, false, false),
        (false, false, false),
    ] {
        let mut egraph = EGraph::default();
        let l = egraph.add(Bool(left).into());
        let r = egraph.add(Bool(right).into());
        let and = egraph.add(And::new([l, r]).into());
        egraph.rebuild();
        assert_eq!(egraph[and].data, Some(expected), "{} & {}", left, right);
    }
}

#[test]
fn const_fold_or() {
    init();
    for (left, right, expected) in [
        (true, true, true),
        (true, false, true),
        (false, true, true),
        (false, false, false),
    ] {
        let mut egraph = EGraph::default();
        let l = egraph.add(Bool(left).into());
        let r = egraph.add(Bool(right).into());
        let or = egraph.add(Or::new([l, r]).into());
        egraph.rebuild();
        assert_eq!(egraph[or].data, Some(expected), "{} | {}", left, right);
    }
}

#[test]
fn implication_table() {
    init();
    let mut egraph = EGraph::default();

    let t = egraph.add(Bool(true).into());
    let f = egraph.add(Bool(false).into());

    let a = egraph.add(Implies::new([t, t]).into());
    let b = egraph.add(Implies::new([t, f]).into());
    let c = egraph.add(Implies::new([f, t]).into());
    let d = egraph.add(Implies::new([f, f]).into());

    assert_eq!(egraph[a].data, Some(true));
    assert_eq!(egraph[b].data, Some(false));
    assert_eq!(egraph[c].data, Some(true));
    assert_eq!(egraph[d].data, Some(true));
}

#[test]
fn merge_with_analysis() {
    init();
    let mut egraph = EGraph::default();

    let id1 = var(&mut egraph, "a");
    let id2 = egraph.add(Bool(true).into());
    assert_eq!(egraph[id1].data, None);

    egraph.merge(id1, id2);
    egraph.rebuild();

    assert_eq!(egraph[id1].data, Some(true));
    assert_eq!(egraph[id2].data, Some(true));
}

#[test]
fn merge_propagates_data_upward() {
    init();
    let mut egraph = EGraph::default();

    let x = var(&mut egraph, "x");
    let not_x = egraph.add(Not::new([x]).into());
    let and = egraph.add(And::new([not_x, not_x]).into());
    let t = egraph.add(Bool(true).into());
    assert_eq!(egraph[not_x].data, None);
    assert_eq!(egraph[and].data, None);

    egraph.merge(x, t);
    egraph.rebuild();

    // learning x = true flows through ¬x into (¬x ∧ ¬x)
    assert_eq!(egraph[x].data, Some(true));
    assert_eq!(egraph[not_x].data, Some(false));
    assert_eq!(egraph[and].data, Some(false));
}

#[test]
fn upward_merge() {
    init();
    let mut egraph = EGraph::default();

    let x = var(&mut egraph, "x");
    let y = var(&mut egraph, "y");
    let a = var(&mut egraph, "a");
    let ax = egraph.add(And::new([a, x]).into());
    let ay = egraph.add(And::new([a, y]).into());

    egraph.merge(x, y); // [x y] [ax] [ay] [a]
    assert_eq!(egraph.size(), 4);
    assert_eq!(egraph.find(x), egraph.find(y));
    assert_ne!(egraph.find(ax), egraph.find(ay));
    assert_ne!(egraph.find(a), egraph.find(x));
    assert_ne!(egraph.find(a), egraph.find(y));

    egraph.rebuild(); // [x y] [ax ay] [a]
    assert_eq!(egraph.size(), 3);
    assert_eq!(egraph.find(x), egraph.find(y));
    assert_eq!(egraph.find(ax), egraph.find(ay));
    assert_ne!(egraph.find(a), egraph.find(x));
    assert_ne!(egraph.find(a), egraph.find(y));
}

#[test]
fn two_level_congruence() {
    init();
    let mut egraph = EGraph::default();

    let x = var(&mut egraph, "x");
    let y = var(&mut egraph, "y");
    let nnx = {
        let nx = egraph.add(Not::new([x]).into());
        egraph.add(Not::new([nx]).into())
    };
    let nny = {
        let ny = egraph.add(Not::new([y]).into());
        egraph.add(Not::new([ny]).into())
    };
    assert_ne!(egraph.find(nnx), egraph.find(nny));

    egraph.merge(x, y);
    egraph.rebuild();

    assert_eq!(egraph.find(nnx), egraph.find(nny));
}

#[test]
fn find_is_idempotent() {
    init();
    let mut egraph = EGraph::default();

    let x = var(&mut egraph, "x");
    let y = var(&mut egraph, "y");
    let z = var(&mut egraph, "z");
    let xy = egraph.add(Or::new([x, y]).into());
    egraph.merge(x, y);
    egraph.merge(y, z);
    egraph.rebuild();

    for id in [x, y, z, xy] {
        assert_eq!(egraph.find(egraph.find(id)), egraph.find(id));
    }
}

#[test]
fn operands_canonical_after_rebuild() {
    init();
    let mut egraph = EGraph::default();

    let x = var(&mut egraph, "x");
    let y = var(&mut egraph, "y");
    let a = var(&mut egraph, "a");
    egraph.add(And::new([a, x]).into());
    egraph.add(And::new([a, y]).into());
    egraph.add(Or::new([x, y]).into());

    egraph.merge(x, y);
    egraph.rebuild();

    for class in egraph.classes() {
        for node in class.iter() {
            for &operand in node.operands() {
                assert_eq!(egraph.find(operand), operand);
            }
        }
    }
}

#[test]
fn leaves_after_rebuild() {
    init();
    let mut egraph = EGraph::default();

    let x = var(&mut egraph, "x");
    let t = egraph.add(Bool(true).into());
    let and = egraph.add(And::new([x, t]).into());
    let or = egraph.add(Or::new([x, t]).into());

    egraph.merge(and, or);
    egraph.rebuild();

    // atoms are the only childless members of their classes
    let x_leaves: Vec<&Prop> = egraph[x].leaves().collect();
    assert_eq!(x_leaves, [&Prop::Var(Var(Symbol::from("x")))]);
    assert_eq!(egraph[t].leaves().count(), 1);

    // the merged composite class has two members but no leaves
    assert_eq!(egraph[and].len(), 2);
    assert_eq!(egraph[and].leaves().count(), 0);

    for class in egraph.classes() {
        class.assert_unique_leaves();
    }
}

#[test]
fn analysis_saturation() {
    init();
    let mut egraph = EGraph::default();

    let x = var(&mut egraph, "x");
    let t = egraph.add(Bool(true).into());
    let f = egraph.add(Bool(false).into());
    let nx = egraph.add(Not::new([x]).into());
    egraph.add(And::new([nx, f]).into());
    egraph.add(Or::new([nx, t]).into());

    egraph.merge(x, f);
    egraph.rebuild();

    // every class's data is the join of `make` over its members
    let mut analysis = ConstantFold;
    for class in egraph.classes() {
        let mut expected = None;
        for node in class.iter() {
            let made = ConstantFold::make(&egraph, node);
            analysis.join(&mut expected, made);
        }
        assert_eq!(expected, class.data, "class {}", class.id);
    }
}
