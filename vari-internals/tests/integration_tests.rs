//! Integration tests for the vari-internals crate.
//!
//! These tests drive the two cores through their public, type-erased API:
//!
//! - `test_big_set_*`: a 220-member set, checking that every member can be
//!   constructed, read back, visited and destroyed exactly once
//! - `test_raw_ptr_*`: visiting, re-indexing and mutating through the pointer
//!   core
//! - `test_raw_val_*`: ownership transfer and swap with destructor counting

use std::{cell::Cell, ptr::NonNull};

use vari_internals::{
    RawPtr, RawVal,
    dispatch::{IndexFn, dispatch_index},
    handlers::{ByValue, Empty, Exclusive, HCons, HNil, Handle, Poly, Shared},
    type_set as set,
    typelist::{Member, TypeIds, TypeSet},
};

thread_local! {
    static TAG_DROPS: Cell<usize> = const { Cell::new(0) };
}

fn tag_drops() -> usize {
    TAG_DROPS.with(Cell::get)
}

/// A distinct member type per `J`, carrying its own index as text.
struct Tag<const J: usize> {
    j: String,
}

impl<const J: usize> Tag<J> {
    fn new() -> Self {
        Self { j: J.to_string() }
    }
}

impl<const J: usize> Drop for Tag<J> {
    fn drop(&mut self) {
        TAG_DROPS.with(|drops| drops.set(drops.get() + 1));
    }
}

type BigSet = set![
    Tag<0>, Tag<1>, Tag<2>, Tag<3>, Tag<4>, Tag<5>, Tag<6>, Tag<7>, Tag<8>, Tag<9>, Tag<10>,
    Tag<11>, Tag<12>, Tag<13>, Tag<14>, Tag<15>, Tag<16>, Tag<17>, Tag<18>, Tag<19>, Tag<20>,
    Tag<21>, Tag<22>, Tag<23>, Tag<24>, Tag<25>, Tag<26>, Tag<27>, Tag<28>, Tag<29>, Tag<30>,
    Tag<31>, Tag<32>, Tag<33>, Tag<34>, Tag<35>, Tag<36>, Tag<37>, Tag<38>, Tag<39>, Tag<40>,
    Tag<41>, Tag<42>, Tag<43>, Tag<44>, Tag<45>, Tag<46>, Tag<47>, Tag<48>, Tag<49>, Tag<50>,
    Tag<51>, Tag<52>, Tag<53>, Tag<54>, Tag<55>, Tag<56>, Tag<57>, Tag<58>, Tag<59>, Tag<60>,
    Tag<61>, Tag<62>, Tag<63>, Tag<64>, Tag<65>, Tag<66>, Tag<67>, Tag<68>, Tag<69>, Tag<70>,
    Tag<71>, Tag<72>, Tag<73>, Tag<74>, Tag<75>, Tag<76>, Tag<77>, Tag<78>, Tag<79>, Tag<80>,
    Tag<81>, Tag<82>, Tag<83>, Tag<84>, Tag<85>, Tag<86>, Tag<87>, Tag<88>, Tag<89>, Tag<90>,
    Tag<91>, Tag<92>, Tag<93>, Tag<94>, Tag<95>, Tag<96>, Tag<97>, Tag<98>, Tag<99>, Tag<100>,
    Tag<101>, Tag<102>, Tag<103>, Tag<104>, Tag<105>, Tag<106>, Tag<107>, Tag<108>, Tag<109>,
    Tag<110>, Tag<111>, Tag<112>, Tag<113>, Tag<114>, Tag<115>, Tag<116>, Tag<117>, Tag<118>,
    Tag<119>, Tag<120>, Tag<121>, Tag<122>, Tag<123>, Tag<124>, Tag<125>, Tag<126>, Tag<127>,
    Tag<128>, Tag<129>, Tag<130>, Tag<131>, Tag<132>, Tag<133>, Tag<134>, Tag<135>, Tag<136>,
    Tag<137>, Tag<138>, Tag<139>, Tag<140>, Tag<141>, Tag<142>, Tag<143>, Tag<144>, Tag<145>,
    Tag<146>, Tag<147>, Tag<148>, Tag<149>, Tag<150>, Tag<151>, Tag<152>, Tag<153>, Tag<154>,
    Tag<155>, Tag<156>, Tag<157>, Tag<158>, Tag<159>, Tag<160>, Tag<161>, Tag<162>, Tag<163>,
    Tag<164>, Tag<165>, Tag<166>, Tag<167>, Tag<168>, Tag<169>, Tag<170>, Tag<171>, Tag<172>,
    Tag<173>, Tag<174>, Tag<175>, Tag<176>, Tag<177>, Tag<178>, Tag<179>, Tag<180>, Tag<181>,
    Tag<182>, Tag<183>, Tag<184>, Tag<185>, Tag<186>, Tag<187>, Tag<188>, Tag<189>, Tag<190>,
    Tag<191>, Tag<192>, Tag<193>, Tag<194>, Tag<195>, Tag<196>, Tag<197>, Tag<198>, Tag<199>,
    Tag<200>, Tag<201>, Tag<202>, Tag<203>, Tag<204>, Tag<205>, Tag<206>, Tag<207>, Tag<208>,
    Tag<209>, Tag<210>, Tag<211>, Tag<212>, Tag<213>, Tag<214>, Tag<215>, Tag<216>, Tag<217>,
    Tag<218>, Tag<219>,
];

struct ReadTag;

impl<const J: usize> Handle<&Tag<J>> for ReadTag {
    type Output = (usize, usize);

    fn handle(self, tag: &Tag<J>) -> (usize, usize) {
        (J, tag.j.parse().unwrap())
    }
}

macro_rules! check_each {
    ($val:ident; $($j:literal)*) => {$(
        $val.emplace(Tag::<$j>::new());
        assert_eq!($val.tagged_index(), $j + 1);
        assert_eq!(
            $val.get::<Tag<$j>, _>().map(|tag| tag.j.as_str()),
            Some(stringify!($j))
        );
        // SAFETY: The value is non-empty and outlives the call.
        let seen = unsafe { $val.as_ptr().visit(Poly(ReadTag), Shared::new()) };
        assert_eq!(seen, ($j, $j));
    )*};
}

#[test]
fn test_big_set_emplace_get_visit() {
    assert_eq!(<BigSet as TypeSet>::LEN, 220);
    assert!(<BigSet as TypeIds>::is_unique());

    let before = tag_drops();
    let mut val = RawVal::<BigSet>::empty();
    check_each!(val;
        0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
        32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59 60
        61 62 63 64 65 66 67 68 69 70 71 72 73 74 75 76 77 78 79 80 81 82 83 84 85 86 87 88 89
        90 91 92 93 94 95 96 97 98 99 100 101 102 103 104 105 106 107 108 109 110 111 112 113
        114 115 116 117 118 119 120 121 122 123 124 125 126 127 128 129 130 131 132 133 134 135
        136 137 138 139 140 141 142 143 144 145 146 147 148 149 150 151 152 153 154 155 156 157
        158 159 160 161 162 163 164 165 166 167 168 169 170 171 172 173 174 175 176 177 178 179
        180 181 182 183 184 185 186 187 188 189 190 191 192 193 194 195 196 197 198 199 200 201
        202 203 204 205 206 207 208 209 210 211 212 213 214 215 216 217 218 219
    );
    // Every emplace but the first dropped exactly one previous member.
    assert_eq!(tag_drops() - before, 219);

    val.destroy();
    assert_eq!(tag_drops() - before, 220);
    assert!(val.is_empty());

    drop(val);
    assert_eq!(tag_drops() - before, 220);
}

#[test]
fn test_big_set_positions() {
    assert_eq!(<BigSet as Member<Tag<0>, _>>::INDEX, 0);
    assert_eq!(<BigSet as Member<Tag<63>, _>>::INDEX, 63);
    assert_eq!(<BigSet as Member<Tag<64>, _>>::INDEX, 64);
    assert_eq!(<BigSet as Member<Tag<219>, _>>::INDEX, 219);

    let names: Vec<_> = (0..220).map(|i| <BigSet as TypeIds>::type_name_at(i).unwrap()).collect();
    assert!(names[17].ends_with("Tag<17>"));
    assert!(names[218].ends_with("Tag<218>"));
}

#[test]
fn test_big_set_size() {
    assert_eq!(
        std::mem::size_of::<<BigSet as TypeSet>::Union>(),
        std::mem::size_of::<String>()
    );
}

struct Square;

impl IndexFn for Square {
    type Output = usize;

    fn call<const J: usize>(self) -> usize {
        J * J
    }
}

#[test]
fn test_big_set_index_dispatch() {
    for i in 0..220 {
        assert_eq!(dispatch_index::<220, _>(i, Square), i * i);
    }
}

type Small = set![i32, String];
type Wide = set![f32, String, i32];

#[test]
fn test_raw_ptr_widen_preserves_member() {
    let value = 42i32;
    let ptr = RawPtr::<Small>::new(NonNull::from(&value));
    let describe = |ptr: RawPtr<Wide>| {
        let arms = HCons {
            head: |_: Empty| "empty".to_string(),
            tail: HCons {
                head: |f: &f32| format!("float {f}"),
                tail: HCons {
                    head: |s: &String| format!("string {s}"),
                    tail: HCons {
                        head: |i: &i32| format!("int {i}"),
                        tail: HNil,
                    },
                },
            },
        };
        // SAFETY: `value` outlives every call.
        unsafe { ptr.visit_nullable(arms, Shared::new()) }
    };

    assert_eq!(describe(RawPtr::empty()), "empty");
    assert_eq!(describe(ptr.widen()), "int 42");
}

#[test]
fn test_raw_ptr_exclusive_visit() {
    let mut text = String::from("wolo");
    let ptr = RawPtr::<Small>::new(NonNull::from(&mut text));
    let arms = HCons {
        head: |i: &mut i32| *i += 1,
        tail: HCons {
            head: |s: &mut String| s.push_str("lo"),
            tail: HNil,
        },
    };
    // SAFETY: `text` is exclusively borrowed by nothing else during the call.
    unsafe { ptr.visit(arms, Exclusive::new()) };
    assert_eq!(text, "wololo");
}

struct DropCounter<'a>(&'a Cell<usize>);

impl Drop for DropCounter<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_raw_val_swap_counts() {
    let drops = Cell::new(0);
    {
        let mut a = RawVal::<set![u64, DropCounter<'_>]>::new(DropCounter(&drops));
        let mut b = RawVal::<set![u64, DropCounter<'_>]>::new(7u64);
        std::mem::swap(&mut a, &mut b);
        assert_eq!(a.get::<u64, _>(), Some(&7));
        assert_eq!(b.tagged_index(), 2);
        assert_eq!(drops.get(), 0);
    }
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_raw_val_take_by_value_once() {
    let drops = Cell::new(0);
    let mut val = RawVal::<set![u64, DropCounter<'_>]>::new(DropCounter(&drops));
    let released = val.release();
    let arms = HCons {
        head: |_: u64| false,
        tail: HCons {
            head: |counter: DropCounter<'_>| {
                drop(counter);
                true
            },
            tail: HNil,
        },
    };
    // SAFETY: The member was released from `val`, which stays in place and is
    // not used until the member has been moved out.
    let moved = unsafe { released.visit(arms, ByValue) };
    assert!(moved);
    assert_eq!(drops.get(), 1);
    drop(val);
    assert_eq!(drops.get(), 1);
}
